//! Whole-catchment time of concentration formulas.
//!
//! Each method maps (length, slope, one method-specific parameter) to a TC in
//! minutes. Slope is passed in percent; each formula converts as its source
//! convention requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_CN: f64 = 75.0;
pub const DEFAULT_C: f64 = 0.3;
pub const DEFAULT_OVERLAND_N: f64 = 0.4;

// NRCS WinTR-55 validity ranges for the lag equation
const SCS_MIN_CN: f64 = 50.0;
const SCS_MAX_CN: f64 = 95.0;
const SCS_MIN_SLOPE_PCT: f64 = 0.5;
const SCS_MAX_SLOPE_PCT: f64 = 64.0;
const SCS_MIN_LENGTH_FT: f64 = 200.0;
const SCS_MAX_LENGTH_FT: f64 = 26000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TcMethod {
    Kirpich,
    Faa,
    ScsLag,
    Kerby,
}

impl TcMethod {
    pub const ALL: [TcMethod; 4] = [
        TcMethod::Kirpich,
        TcMethod::Faa,
        TcMethod::ScsLag,
        TcMethod::Kerby,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            TcMethod::Kirpich => "kirpich",
            TcMethod::Faa => "faa",
            TcMethod::ScsLag => "scs_lag",
            TcMethod::Kerby => "kerby",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TcMethod::Kirpich => "Kirpich",
            TcMethod::Faa => "FAA",
            TcMethod::ScsLag => "SCS Lag",
            TcMethod::Kerby => "Kerby",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TcMethod::Kirpich => "Rural watersheds with defined channels",
            TcMethod::Faa => "Urban areas, regulatory standard",
            TcMethod::ScsLag => "NRCS lag equation (Tc = Lag / 0.6)",
            TcMethod::Kerby => "Overland flow with surface roughness",
        }
    }

    /// Evaluate the method. Parameters a method does not use are ignored;
    /// missing or unusable ones fall back to the documented defaults.
    pub fn calculate(&self, length_ft: f64, slope_pct: f64, params: &MethodParams) -> MethodOutcome {
        if length_ft <= 0.0 || slope_pct <= 0.0 {
            return MethodOutcome::default();
        }
        match self {
            TcMethod::Kirpich => MethodOutcome::value(kirpich(length_ft, slope_pct)),
            TcMethod::Faa => {
                let mut outcome = MethodOutcome::default();
                let c = match params.runoff_coefficient {
                    Some(c) if (0.0..=1.0).contains(&c) => c,
                    Some(c) => {
                        outcome.warnings.push(format!(
                            "runoff coefficient {} outside [0, 1], using {}",
                            c, DEFAULT_C
                        ));
                        DEFAULT_C
                    }
                    None => DEFAULT_C,
                };
                outcome.tc_minutes = faa(length_ft, slope_pct, c);
                outcome
            }
            TcMethod::ScsLag => scs_lag(length_ft, slope_pct, params.curve_number),
            TcMethod::Kerby => {
                let mut outcome = MethodOutcome::default();
                let n = match params.mannings_n {
                    Some(n) if n > 0.0 && n.is_finite() => n,
                    Some(n) => {
                        outcome.warnings.push(format!(
                            "Manning's n {} not usable, using {}",
                            n, DEFAULT_OVERLAND_N
                        ));
                        DEFAULT_OVERLAND_N
                    }
                    None => DEFAULT_OVERLAND_N,
                };
                outcome.tc_minutes = kerby(length_ft, slope_pct, n);
                outcome
            }
        }
    }
}

impl fmt::Display for TcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TcMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "kirpich" => Ok(TcMethod::Kirpich),
            "faa" => Ok(TcMethod::Faa),
            "scs_lag" | "scs" | "nrcs_lag" => Ok(TcMethod::ScsLag),
            "kerby" => Ok(TcMethod::Kerby),
            other => Err(format!("unknown TC method '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MethodParams {
    pub curve_number: Option<f64>,
    pub runoff_coefficient: Option<f64>,
    pub mannings_n: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodOutcome {
    pub tc_minutes: f64,
    pub warnings: Vec<String>,
}

impl MethodOutcome {
    fn value(tc_minutes: f64) -> Self {
        MethodOutcome {
            tc_minutes,
            warnings: Vec::new(),
        }
    }
}

/// Kirpich (1940): tc = 0.0078 L^0.77 / S^0.385, S in ft/ft.
pub fn kirpich(length_ft: f64, slope_pct: f64) -> f64 {
    if length_ft <= 0.0 || slope_pct <= 0.0 {
        return 0.0;
    }
    let slope = slope_pct / 100.0;
    0.0078 * length_ft.powf(0.77) / slope.powf(0.385)
}

/// FAA (1965): tc = 1.8 (1.1 - C) L^0.5 / S^0.33.
///
/// The slope term takes percent, not ft/ft. Downstream validation relies on
/// this form, so it is kept as is.
pub fn faa(length_ft: f64, slope_pct: f64, runoff_coefficient: f64) -> f64 {
    if length_ft <= 0.0 || slope_pct <= 0.0 {
        return 0.0;
    }
    1.8 * (1.1 - runoff_coefficient) * length_ft.sqrt() / slope_pct.powf(0.33)
}

/// Kerby: tc = 1.44 (n L)^0.467 / S^0.235, S in ft/ft.
pub fn kerby(length_ft: f64, slope_pct: f64, mannings_n: f64) -> f64 {
    if length_ft <= 0.0 || slope_pct <= 0.0 || mannings_n <= 0.0 {
        return 0.0;
    }
    let slope = slope_pct / 100.0;
    1.44 * (mannings_n * length_ft).powf(0.467) / slope.powf(0.235)
}

/// NRCS lag: Lag = L^0.8 (1000/CN - 9)^0.7 / (1900 Y^0.5), Y in percent,
/// Tc = Lag / 0.6. Inputs outside the WinTR-55 ranges are still evaluated
/// but produce warnings.
pub fn scs_lag(length_ft: f64, slope_pct: f64, curve_number: Option<f64>) -> MethodOutcome {
    let mut outcome = MethodOutcome::default();
    if length_ft <= 0.0 || slope_pct <= 0.0 {
        return outcome;
    }

    let cn = match curve_number {
        Some(cn) if cn > 0.0 && cn <= 100.0 => cn,
        Some(cn) => {
            outcome
                .warnings
                .push(format!("CN {} not usable, using {}", cn, DEFAULT_CN));
            DEFAULT_CN
        }
        None => DEFAULT_CN,
    };

    if cn < SCS_MIN_CN {
        outcome.warnings.push(format!(
            "CN ({}) below minimum ({}), results may be unreliable",
            cn, SCS_MIN_CN
        ));
    } else if cn > SCS_MAX_CN {
        outcome.warnings.push(format!(
            "CN ({}) above maximum ({}), results may be unreliable",
            cn, SCS_MAX_CN
        ));
    }
    if slope_pct < SCS_MIN_SLOPE_PCT {
        outcome.warnings.push(format!(
            "slope ({:.2}%) below minimum ({}%)",
            slope_pct, SCS_MIN_SLOPE_PCT
        ));
    } else if slope_pct > SCS_MAX_SLOPE_PCT {
        outcome.warnings.push(format!(
            "slope ({:.2}%) above maximum ({}%)",
            slope_pct, SCS_MAX_SLOPE_PCT
        ));
    }
    if length_ft < SCS_MIN_LENGTH_FT {
        outcome.warnings.push(format!(
            "length ({:.0} ft) below minimum ({} ft)",
            length_ft, SCS_MIN_LENGTH_FT
        ));
    } else if length_ft > SCS_MAX_LENGTH_FT {
        outcome.warnings.push(format!(
            "length ({:.0} ft) above maximum ({} ft)",
            length_ft, SCS_MAX_LENGTH_FT
        ));
    }

    let mut retention = 1000.0 / cn - 9.0;
    if retention <= 0.0 {
        retention = 0.1;
    }

    let lag_hours = length_ft.powf(0.8) * retention.powf(0.7) / (1900.0 * slope_pct.sqrt());
    outcome.tc_minutes = lag_hours / 0.6 * 60.0;
    outcome
}
