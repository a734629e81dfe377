use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hydraulic radius (ft) of a trapezoidal section flowing at `depth`.
/// A side slope of 0 is a rectangular section. Falls back to 1.0 ft for
/// non-positive depth or width, a negative side slope, or non-finite input.
pub fn hydraulic_radius_trapezoid(depth: f64, bottom_width: f64, side_slope: f64) -> f64 {
    let finite = depth.is_finite() && bottom_width.is_finite() && side_slope.is_finite();
    if !finite || depth <= 0.0 || bottom_width <= 0.0 || side_slope < 0.0 {
        return 1.0;
    }

    // side_slope is horizontal run per unit of vertical rise
    let top_width = bottom_width + 2.0 * side_slope * depth;
    let area = (bottom_width + top_width) / 2.0 * depth;
    let wetted_perimeter = bottom_width + 2.0 * depth * (1.0 + side_slope * side_slope).sqrt();

    if wetted_perimeter > 0.0 {
        area / wetted_perimeter
    } else {
        1.0
    }
}

/// Hydraulic radius (ft) of a circular pipe flowing full, D/4.
pub fn hydraulic_radius_pipe(diameter: f64) -> f64 {
    if diameter <= 0.0 {
        return 0.375;
    }
    diameter / 4.0
}

// Channel and pipe geometry for a catchment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelGeometry {
    pub depth_ft: f64,
    pub bottom_width_ft: f64,
    pub side_slope_h_per_v: f64,
    pub pipe_diameter_ft: f64,
}

impl ChannelGeometry {
    pub fn channel_radius(&self) -> f64 {
        hydraulic_radius_trapezoid(self.depth_ft, self.bottom_width_ft, self.side_slope_h_per_v)
    }

    pub fn pipe_radius(&self) -> f64 {
        hydraulic_radius_pipe(self.pipe_diameter_ft)
    }
}

/// Catchment-specific geometry with an optional global default.
///
/// Lookups try the catchment first, then the global entry.
#[derive(Debug, Clone, Default)]
pub struct GeometryTable {
    pub global: Option<ChannelGeometry>,
    pub by_catchment: HashMap<String, ChannelGeometry>,
}

impl GeometryTable {
    pub fn new(global: Option<ChannelGeometry>) -> Self {
        GeometryTable {
            global,
            by_catchment: HashMap::new(),
        }
    }

    pub fn insert(&mut self, catchment_id: &str, geometry: ChannelGeometry) {
        self.by_catchment.insert(catchment_id.to_string(), geometry);
    }

    pub fn lookup(&self, catchment_id: &str) -> Option<&ChannelGeometry> {
        self.by_catchment.get(catchment_id).or(self.global.as_ref())
    }
}
