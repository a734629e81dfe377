use crate::catchment::SegmentTc;
use crate::methods::TcMethod;

// One method applied to one catchment
#[derive(Debug, Clone, PartialEq)]
pub struct TcResult {
    pub method: TcMethod,
    pub tc_minutes: f64,
    /// Value before the minimum-TC floor.
    pub raw_tc_minutes: f64,
    pub minimum_applied: bool,
    pub warnings: Vec<String>,
}

// Everything computed for one catchment
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentResult {
    pub catchment_id: String,
    pub length_ft: f64,
    /// Effective slope used by the methods, after any adjustment.
    pub slope_pct: f64,
    pub segment_tc: Option<SegmentTc>,
    pub velocity_tc_min: Option<f64>,
    pub methods: Vec<TcResult>,
    pub warnings: Vec<String>,
    pub adjusted: bool,
}

impl CatchmentResult {
    pub fn new(catchment_id: &str, length_ft: f64, slope_pct: f64) -> Self {
        CatchmentResult {
            catchment_id: catchment_id.to_string(),
            length_ft,
            slope_pct,
            segment_tc: None,
            velocity_tc_min: None,
            methods: Vec::new(),
            warnings: Vec::new(),
            adjusted: false,
        }
    }

    pub fn tc_for(&self, method: TcMethod) -> Option<f64> {
        self.methods
            .iter()
            .find(|r| r.method == method)
            .map(|r| r.tc_minutes)
    }

    pub fn segment_tc_min(&self) -> Option<f64> {
        self.segment_tc.as_ref().map(|s| s.total_min)
    }

    /// Every TC value reported for this catchment, in column order.
    pub fn all_tc_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.segment_tc_min()
            .into_iter()
            .chain(self.methods.iter().map(|r| r.tc_minutes))
            .chain(self.velocity_tc_min)
    }
}
