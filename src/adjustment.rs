//! Flat-terrain and minimum-TC fallback rules.
//!
//! Slope rules follow TxDOT / Cleveland et al. (2012) for low-slope
//! watersheds; the TC floors follow NRCS (0.1 h) and the Caltrans HDM
//! (5 min paved, 10 min rural).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Land classification used to pick the minimum TC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LandType {
    Paved,
    Rural,
    /// Forested catchments. Shares the rural floor.
    Woods,
    #[default]
    General,
}

impl LandType {
    /// Resolve a free-form land-use tag. Unknown tags fall back to `General`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "paved" | "urban" | "impervious" => LandType::Paved,
            "rural" | "undeveloped" | "natural" => LandType::Rural,
            "woods" | "forest" | "wooded" => LandType::Woods,
            _ => LandType::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LandType::Paved => "paved",
            LandType::Rural => "rural",
            LandType::Woods => "woods",
            LandType::General => "general",
        }
    }
}

impl FromStr for LandType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LandType::from_tag(s))
    }
}

/// Thresholds for slope and TC adjustment. Slopes are ft/ft, times are minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentPolicy {
    pub min_slope_threshold: f64,
    pub transitional_upper: f64,
    pub low_slope_add: f64,
    pub min_tc_paved: f64,
    pub min_tc_rural: f64,
    pub min_tc_default: f64,
}

impl Default for AdjustmentPolicy {
    fn default() -> Self {
        AdjustmentPolicy {
            min_slope_threshold: 0.002,
            transitional_upper: 0.003,
            low_slope_add: 0.0005,
            min_tc_paved: 5.0,
            min_tc_rural: 10.0,
            min_tc_default: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlopeAdjustment {
    pub slope_ftft: f64,
    pub was_adjusted: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TcFloor {
    pub tc_minutes: f64,
    pub was_adjusted: bool,
    pub warning: Option<String>,
}

impl AdjustmentPolicy {
    /// Classify a slope (ft/ft) and apply the low-slope rules.
    pub fn adjust_slope(&self, slope_ftft: f64) -> SlopeAdjustment {
        if slope_ftft < 0.0 {
            SlopeAdjustment {
                slope_ftft: self.low_slope_add,
                was_adjusted: true,
                warning: Some(format!(
                    "adverse slope ({:.3}%), applied minimum slope of {:.3}%",
                    slope_ftft * 100.0,
                    self.low_slope_add * 100.0
                )),
            }
        } else if slope_ftft < self.min_slope_threshold {
            let adjusted = slope_ftft + self.low_slope_add;
            SlopeAdjustment {
                slope_ftft: adjusted,
                was_adjusted: true,
                warning: Some(format!(
                    "low slope ({:.3}%), TxDOT adjustment applied: S + {} = {:.3}%",
                    slope_ftft * 100.0,
                    self.low_slope_add,
                    adjusted * 100.0
                )),
            }
        } else if slope_ftft < self.transitional_upper {
            SlopeAdjustment {
                slope_ftft,
                was_adjusted: false,
                warning: Some(format!(
                    "transitional slope ({:.3}%), flag for review",
                    slope_ftft * 100.0
                )),
            }
        } else {
            SlopeAdjustment {
                slope_ftft,
                was_adjusted: false,
                warning: None,
            }
        }
    }

    /// Low-slope correction used inside the segment calculators: add the
    /// increment below the threshold, otherwise pass through.
    pub fn correct_low_slope(&self, slope_ftft: f64) -> f64 {
        if slope_ftft < self.min_slope_threshold {
            slope_ftft + self.low_slope_add
        } else {
            slope_ftft
        }
    }

    pub fn minimum_tc(&self, land_type: LandType) -> f64 {
        match land_type {
            LandType::Paved => self.min_tc_paved,
            LandType::Rural | LandType::Woods => self.min_tc_rural,
            LandType::General => self.min_tc_default,
        }
    }

    /// Raise `tc_minutes` to the floor for `land_type`. Idempotent.
    pub fn enforce_minimum_tc(&self, tc_minutes: f64, land_type: LandType) -> TcFloor {
        let floor = self.minimum_tc(land_type);
        if tc_minutes < floor {
            TcFloor {
                tc_minutes: floor,
                was_adjusted: true,
                warning: Some(format!(
                    "computed TC ({:.1} min) below {} minimum, using {} min",
                    tc_minutes,
                    land_type.as_str(),
                    floor
                )),
            }
        } else {
            TcFloor {
                tc_minutes,
                was_adjusted: false,
                warning: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn adverse_slope_uses_minimum() {
        let policy = AdjustmentPolicy::default();
        let adj = policy.adjust_slope(-0.01);
        assert_relative_eq!(adj.slope_ftft, 0.0005);
        assert!(adj.was_adjusted);
        assert!(adj.warning.unwrap().starts_with("adverse slope"));
    }

    #[test]
    fn low_slope_gets_increment() {
        let policy = AdjustmentPolicy::default();
        let adj = policy.adjust_slope(0.001);
        assert_relative_eq!(adj.slope_ftft, 0.0015);
        assert!(adj.was_adjusted);
        assert!(adj.warning.unwrap().starts_with("low slope"));

        let flat = policy.adjust_slope(0.0);
        assert_relative_eq!(flat.slope_ftft, 0.0005);
    }

    #[test]
    fn transitional_slope_is_flagged_only() {
        let policy = AdjustmentPolicy::default();
        let adj = policy.adjust_slope(0.0025);
        assert_eq!(adj.slope_ftft, 0.0025);
        assert!(!adj.was_adjusted);
        assert!(adj.warning.unwrap().starts_with("transitional slope"));

        let edge = policy.adjust_slope(0.002);
        assert!(!edge.was_adjusted);
        assert!(edge.warning.is_some());
    }

    #[test]
    fn normal_slope_passes_through() {
        let policy = AdjustmentPolicy::default();
        let adj = policy.adjust_slope(0.003);
        assert_eq!(adj.slope_ftft, 0.003);
        assert!(!adj.was_adjusted);
        assert!(adj.warning.is_none());
    }

    #[test]
    fn adjusted_slope_is_never_negative_and_stable_above_transition() {
        let policy = AdjustmentPolicy::default();
        for raw in [-1.0, -0.002, 0.0, 0.0001, 0.0019, 0.0021, 0.0029, 0.01, 0.5] {
            let once = policy.adjust_slope(raw);
            assert!(once.slope_ftft > 0.0, "{raw}");
            if once.slope_ftft >= policy.transitional_upper {
                let twice = policy.adjust_slope(once.slope_ftft);
                assert_eq!(twice.slope_ftft, once.slope_ftft);
                assert!(!twice.was_adjusted);
            }
        }
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let policy = AdjustmentPolicy {
            min_slope_threshold: 0.01,
            low_slope_add: 0.001,
            ..AdjustmentPolicy::default()
        };
        let adj = policy.adjust_slope(0.005);
        assert_relative_eq!(adj.slope_ftft, 0.006);
        assert!(adj.was_adjusted);
    }

    #[test]
    fn minimum_tc_by_land_type() {
        let policy = AdjustmentPolicy::default();
        assert_eq!(policy.enforce_minimum_tc(2.0, LandType::Paved).tc_minutes, 5.0);
        assert_eq!(policy.enforce_minimum_tc(2.0, LandType::Rural).tc_minutes, 10.0);
        assert_eq!(policy.enforce_minimum_tc(2.0, LandType::General).tc_minutes, 6.0);
        assert_eq!(policy.enforce_minimum_tc(2.0, LandType::Woods).tc_minutes, 10.0);

        let pass = policy.enforce_minimum_tc(12.5, LandType::Rural);
        assert_eq!(pass.tc_minutes, 12.5);
        assert!(!pass.was_adjusted);
        assert!(pass.warning.is_none());
    }

    #[test]
    fn minimum_tc_is_idempotent_and_never_decreases() {
        let policy = AdjustmentPolicy::default();
        for land in [LandType::Paved, LandType::Rural, LandType::Woods, LandType::General] {
            for tc in [0.5, 4.99, 5.0, 6.0, 9.9, 10.0, 42.0] {
                let once = policy.enforce_minimum_tc(tc, land);
                assert!(once.tc_minutes >= tc);
                assert!(once.tc_minutes >= policy.minimum_tc(land));
                let twice = policy.enforce_minimum_tc(once.tc_minutes, land);
                assert_eq!(twice.tc_minutes, once.tc_minutes);
                assert!(!twice.was_adjusted);
            }
        }
    }

    #[test]
    fn land_type_tags() {
        assert_eq!(LandType::from_tag("Urban"), LandType::Paved);
        assert_eq!(LandType::from_tag(" impervious "), LandType::Paved);
        assert_eq!(LandType::from_tag("UNDEVELOPED"), LandType::Rural);
        assert_eq!(LandType::from_tag("natural"), LandType::Rural);
        assert_eq!(LandType::from_tag("Forest"), LandType::Woods);
        assert_eq!(LandType::from_tag("woods").as_str(), "woods");
        assert_eq!(LandType::from_tag("residential"), LandType::General);
        assert_eq!("".parse::<LandType>().unwrap(), LandType::General);
    }
}
