//! TR-55 segment travel times.
//!
//! Every calculator takes length in feet and slope in percent and returns
//! minutes. Degenerate input (non-positive or non-finite length, slope,
//! roughness, rainfall or diameter) yields 0.0, which callers read as an
//! inactive segment.

use crate::adjustment::{AdjustmentPolicy, LandType};
use crate::hydraulics::hydraulic_radius_pipe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TR-55 hard limit on sheet flow length (ft).
pub const MAX_SHEET_FLOW_LENGTH_FT: f64 = 300.0;
/// Concrete pipe roughness used when no n is supplied.
pub const DEFAULT_PIPE_N: f64 = 0.013;
/// Roughness used for segments missing an n value.
pub const DEFAULT_SEGMENT_N: f64 = 0.035;
/// Manning's n below which a shallow-concentrated segment is treated as paved.
pub const PAVED_N_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    Sheet,
    ShallowConcentrated,
    Channel,
    Pipe,
}

impl FlowType {
    /// Resolve a layer tag such as `SHEET`, `SHALLOW_CONC` or `PIPE`.
    /// Anything unrecognized is treated as channel flow. `PIPE` wins over
    /// `CONC`, so `CONCRETE_PIPE` is a pipe.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_uppercase();
        if tag.contains("SHEET") {
            FlowType::Sheet
        } else if tag.contains("PIPE") {
            FlowType::Pipe
        } else if tag.contains("SHALLOW") || tag.contains("CONC") {
            FlowType::ShallowConcentrated
        } else {
            FlowType::Channel
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Sheet => "SHEET",
            FlowType::ShallowConcentrated => "SHALLOW_CONC",
            FlowType::Channel => "CHANNEL",
            FlowType::Pipe => "PIPE",
        }
    }
}

impl FromStr for FlowType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FlowType::from_tag(s))
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shallow concentrated flow surfaces (TR-55 Figure 3-1), V = Cp * S^0.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Paved,
    Unpaved,
    GrassedWaterway,
    NearlyBare,
    CultivatedRow,
    ShortGrassPrairie,
    MinimumTillage,
    ForestHeavyLitter,
}

impl SurfaceType {
    pub fn velocity_coefficient(&self) -> f64 {
        match self {
            SurfaceType::Paved => 20.328,
            SurfaceType::Unpaved | SurfaceType::GrassedWaterway => 16.1345,
            SurfaceType::NearlyBare => 9.965,
            SurfaceType::CultivatedRow => 8.762,
            SurfaceType::ShortGrassPrairie => 6.962,
            SurfaceType::MinimumTillage => 5.032,
            SurfaceType::ForestHeavyLitter => 2.516,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "paved" => Some(SurfaceType::Paved),
            "unpaved" => Some(SurfaceType::Unpaved),
            "grassed_waterway" => Some(SurfaceType::GrassedWaterway),
            "nearly_bare" => Some(SurfaceType::NearlyBare),
            "cultivated_row" => Some(SurfaceType::CultivatedRow),
            "short_grass_prairie" => Some(SurfaceType::ShortGrassPrairie),
            "minimum_tillage" => Some(SurfaceType::MinimumTillage),
            "forest_heavy_litter" => Some(SurfaceType::ForestHeavyLitter),
            _ => None,
        }
    }

    /// Classification used when a segment carries no explicit surface tag.
    pub fn from_mannings_n(n: f64) -> Self {
        if n < PAVED_N_THRESHOLD {
            SurfaceType::Paved
        } else {
            SurfaceType::Unpaved
        }
    }
}

// NaN and infinities count as missing
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

// One reach of a flow path
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSegment {
    pub length_ft: f64,
    pub slope_pct: f64,
    pub mannings_n: f64,
    pub flow_type: FlowType,
    pub surface: Option<SurfaceType>,
}

impl FlowSegment {
    pub fn new(flow_type: FlowType, length_ft: f64, slope_pct: f64, mannings_n: f64) -> Self {
        FlowSegment {
            length_ft,
            slope_pct,
            mannings_n,
            flow_type,
            surface: None,
        }
    }

    pub fn surface_type(&self) -> SurfaceType {
        self.surface
            .unwrap_or_else(|| SurfaceType::from_mannings_n(self.mannings_n))
    }
}

/// TR-55 Eq. 3-3 sheet flow. Length is clamped to 300 ft and the low-slope
/// correction always applies.
pub fn sheet_flow_time(
    length_ft: f64,
    slope_pct: f64,
    mannings_n: f64,
    p2_rainfall_in: f64,
    policy: &AdjustmentPolicy,
) -> f64 {
    if !(positive(length_ft) && positive(slope_pct) && positive(mannings_n) && positive(p2_rainfall_in)) {
        return 0.0;
    }
    let length_ft = length_ft.min(MAX_SHEET_FLOW_LENGTH_FT);

    let slope = policy.correct_low_slope(slope_pct / 100.0);
    let tt_hours =
        0.007 * (mannings_n * length_ft).powf(0.8) / (p2_rainfall_in.sqrt() * slope.powf(0.4));
    tt_hours * 60.0
}

/// Shallow concentrated flow, V = Cp * sqrt(S).
pub fn shallow_concentrated_time(
    length_ft: f64,
    slope_pct: f64,
    surface: SurfaceType,
    policy: &AdjustmentPolicy,
) -> f64 {
    if !(positive(length_ft) && positive(slope_pct)) {
        return 0.0;
    }

    let slope = policy.correct_low_slope(slope_pct / 100.0);
    let velocity_fps = surface.velocity_coefficient() * slope.sqrt();
    if velocity_fps <= 0.0 {
        return 0.0;
    }
    (length_ft / velocity_fps) / 60.0
}

/// Open channel flow by Manning's equation. The low-slope correction is
/// applied only when a policy is passed.
pub fn channel_flow_time(
    length_ft: f64,
    slope_pct: f64,
    mannings_n: f64,
    hydraulic_radius_ft: f64,
    policy: Option<&AdjustmentPolicy>,
) -> f64 {
    if !(positive(length_ft) && positive(slope_pct) && positive(mannings_n) && positive(hydraulic_radius_ft)) {
        return 0.0;
    }

    let mut slope = slope_pct / 100.0;
    if let Some(policy) = policy {
        slope = policy.correct_low_slope(slope);
    }
    let velocity_fps = (1.49 / mannings_n) * hydraulic_radius_ft.powf(2.0 / 3.0) * slope.sqrt();
    if velocity_fps <= 0.0 {
        return 0.0;
    }
    (length_ft / velocity_fps) / 60.0
}

/// Full-flow circular pipe: Manning's equation with R = D/4.
pub fn pipe_flow_time(
    length_ft: f64,
    slope_pct: f64,
    mannings_n: Option<f64>,
    diameter_ft: f64,
    policy: Option<&AdjustmentPolicy>,
) -> f64 {
    if !positive(diameter_ft) {
        return 0.0;
    }
    let n = mannings_n.unwrap_or(DEFAULT_PIPE_N);
    channel_flow_time(
        length_ft,
        slope_pct,
        n,
        hydraulic_radius_pipe(diameter_ft),
        policy,
    )
}

/// Everything the dispatcher needs besides the segment itself.
#[derive(Debug, Clone, Copy)]
pub struct SegmentContext<'a> {
    pub policy: &'a AdjustmentPolicy,
    pub p2_rainfall_in: f64,
    pub channel_radius_ft: f64,
    pub pipe_diameter_ft: f64,
    pub adjust_conveyance_slopes: bool,
}

/// Travel time (minutes) of one segment, by flow type.
pub fn segment_travel_time(segment: &FlowSegment, ctx: &SegmentContext) -> f64 {
    let conveyance_policy = ctx.adjust_conveyance_slopes.then_some(ctx.policy);
    match segment.flow_type {
        FlowType::Sheet => sheet_flow_time(
            segment.length_ft,
            segment.slope_pct,
            segment.mannings_n,
            ctx.p2_rainfall_in,
            ctx.policy,
        ),
        FlowType::ShallowConcentrated => shallow_concentrated_time(
            segment.length_ft,
            segment.slope_pct,
            segment.surface_type(),
            ctx.policy,
        ),
        FlowType::Channel => channel_flow_time(
            segment.length_ft,
            segment.slope_pct,
            segment.mannings_n,
            ctx.channel_radius_ft,
            conveyance_policy,
        ),
        FlowType::Pipe => pipe_flow_time(
            segment.length_ft,
            segment.slope_pct,
            Some(segment.mannings_n),
            ctx.pipe_diameter_ft,
            conveyance_policy,
        ),
    }
}

/// Breakdown of the simplified TR-55 velocity estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityEstimate {
    pub sheet_length_ft: f64,
    pub shallow_length_ft: f64,
    pub channel_length_ft: f64,
    pub sheet_min: f64,
    pub shallow_min: f64,
    pub channel_min: f64,
}

impl VelocityEstimate {
    pub fn total_min(&self) -> f64 {
        self.sheet_min + self.shallow_min + self.channel_min
    }
}

/// TR-55 velocity estimate for a catchment without a traced flow path.
///
/// The first 100 ft is sheet flow and the rest shallow concentrated flow;
/// when more than 1000 ft remains, 20% of it is routed as a grass channel
/// (n = 0.035, R = 1 ft). Woods use dense-woods sheet roughness (0.80) and
/// the forest-litter shallow coefficient.
pub fn simplified_velocity_tc(
    total_length_ft: f64,
    slope_pct: f64,
    land_type: LandType,
    p2_rainfall_in: f64,
    policy: &AdjustmentPolicy,
) -> Option<VelocityEstimate> {
    if !(positive(total_length_ft) && positive(slope_pct)) {
        return None;
    }

    let (sheet_n, surface) = match land_type {
        LandType::Paved => (0.011, SurfaceType::Paved),
        LandType::Rural => (0.15, SurfaceType::Unpaved),
        LandType::Woods => (0.80, SurfaceType::ForestHeavyLitter),
        LandType::General => (0.24, SurfaceType::Unpaved),
    };

    let sheet_length_ft = total_length_ft.min(100.0);
    let remaining = total_length_ft - sheet_length_ft;
    let (shallow_length_ft, channel_length_ft) = if remaining > 1000.0 {
        (remaining * 0.8, remaining * 0.2)
    } else {
        (remaining, 0.0)
    };

    Some(VelocityEstimate {
        sheet_length_ft,
        shallow_length_ft,
        channel_length_ft,
        sheet_min: sheet_flow_time(sheet_length_ft, slope_pct, sheet_n, p2_rainfall_in, policy),
        shallow_min: shallow_concentrated_time(shallow_length_ft, slope_pct, surface, policy),
        channel_min: channel_flow_time(
            channel_length_ft,
            slope_pct,
            DEFAULT_SEGMENT_N,
            1.0,
            Some(policy),
        ),
    })
}
