//! The three ways catchment data enters a run. Each adapter produces the
//! same [`CatchmentInput`] list for the comparison pass.

pub mod dem;
pub mod manual;
pub mod segment_layer;

use crate::catchment::CatchmentInput;
use crate::config::TcConfig;
use crate::error::Result;
use std::fmt;

pub use dem::{DemFieldMapping, DemInput, PolygonFeature};
pub use manual::ManualEntryRow;
pub use segment_layer::{SegmentLayerInput, SegmentRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    SegmentLayer,
    ManualEntry,
    DemExtraction,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::SegmentLayer => "segment layer",
            ModeKind::ManualEntry => "manual entry",
            ModeKind::DemExtraction => "DEM extraction",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for exactly one acquisition mode.
#[derive(Debug)]
pub enum AcquisitionMode {
    SegmentLayer(SegmentLayerInput),
    ManualEntry(Vec<ManualEntryRow>),
    DemExtraction(DemInput),
}

impl AcquisitionMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            AcquisitionMode::SegmentLayer(_) => ModeKind::SegmentLayer,
            AcquisitionMode::ManualEntry(_) => ModeKind::ManualEntry,
            AcquisitionMode::DemExtraction(_) => ModeKind::DemExtraction,
        }
    }

    /// Run the adapter for this mode. Errors are fatal for the whole run.
    pub fn normalize(&self, config: &TcConfig) -> Result<Vec<CatchmentInput>> {
        match self {
            AcquisitionMode::SegmentLayer(input) => segment_layer::normalize(input, config),
            AcquisitionMode::ManualEntry(rows) => manual::normalize(rows, config),
            AcquisitionMode::DemExtraction(input) => dem::normalize(input, config),
        }
    }
}
