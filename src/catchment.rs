use crate::adjustment::LandType;
use crate::hydraulics::ChannelGeometry;
use crate::methods::MethodParams;
use crate::travel_time::FlowSegment;

/// Normalized unit of work for the comparison pass, one per subbasin.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentRecord {
    pub id: String,
    pub total_length_ft: f64,
    pub avg_slope_pct: f64,
    pub curve_number: f64,
    pub runoff_coefficient: f64,
    pub mannings_n_avg: f64,
    pub land_type: LandType,
    pub segments: Option<Vec<FlowSegment>>,
    pub high_elevation_ft: Option<f64>,
    pub low_elevation_ft: Option<f64>,
    /// Set when the adapter already ran the slope policy on `avg_slope_pct`.
    pub slope_policy_applied: bool,
}

impl CatchmentRecord {
    pub fn method_params(&self) -> MethodParams {
        MethodParams {
            curve_number: Some(self.curve_number),
            runoff_coefficient: Some(self.runoff_coefficient),
            mannings_n: Some(self.mannings_n_avg),
        }
    }
}

/// Per-catchment overrides of the run defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatchmentParams {
    pub curve_number: Option<f64>,
    pub runoff_coefficient: Option<f64>,
    pub mannings_n: Option<f64>,
    pub land_type: Option<LandType>,
    pub geometry: Option<ChannelGeometry>,
    /// Pipe diameter (ft). Applies with or without channel geometry.
    pub pipe_diameter_ft: Option<f64>,
}

// Travel time of one segment, kept for the detail export
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTime {
    pub segment: FlowSegment,
    pub travel_time_min: f64,
}

/// Sum of segment travel times for one catchment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTc {
    pub total_min: f64,
    pub details: Vec<SegmentTime>,
}

/// Adapter output: the record plus anything the adapter computed or noticed.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentInput {
    pub record: CatchmentRecord,
    /// `None` when segment TC is unavailable for the mode or undefined.
    pub segment_tc: Option<SegmentTc>,
    pub warnings: Vec<String>,
    pub adjusted: bool,
}

impl CatchmentInput {
    pub fn new(record: CatchmentRecord) -> Self {
        CatchmentInput {
            record,
            segment_tc: None,
            warnings: Vec::new(),
            adjusted: false,
        }
    }
}
