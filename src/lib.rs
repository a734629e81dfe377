//! Time of concentration for small catchments.
//!
//! Catchment data arrives through one of three acquisition modes (flow-path
//! segments, a manual table, or DEM sampling), is normalized into
//! [`CatchmentRecord`]s, and run through the Kirpich, FAA, SCS Lag and Kerby
//! methods. Segment input additionally yields a TR-55 travel-time sum.

pub mod acquisition;
pub mod adjustment;
pub mod catchment;
pub mod comparison;
pub mod config;
pub mod error;
pub mod hydraulics;
pub mod io;
pub mod methods;
pub mod raster;
pub mod report;
pub mod state;
pub mod travel_time;

pub use acquisition::{AcquisitionMode, ModeKind};
pub use adjustment::{AdjustmentPolicy, LandType};
pub use catchment::{CatchmentInput, CatchmentParams, CatchmentRecord, SegmentTc};
pub use comparison::{RecordError, RunReport, compare_catchment, run, run_with_progress};
pub use config::{ColumnConfig, TcConfig};
pub use error::{Result, TcError};
pub use io::results::{CatchmentResult, TcResult};
pub use methods::TcMethod;
pub use report::RunSummary;
pub use state::AcquisitionSession;
pub use travel_time::{FlowSegment, FlowType, SurfaceType};
