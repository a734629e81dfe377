use crate::acquisition::{
    AcquisitionMode, DemFieldMapping, DemInput, ManualEntryRow, ModeKind, PolygonFeature,
    SegmentLayerInput, SegmentRow,
};
use crate::catchment::CatchmentParams;
use crate::error::{Result, TcError};
use crate::raster::{ElevationSource, LinearUnit};
use tracing::info;

fn empty_mode(kind: ModeKind) -> AcquisitionMode {
    match kind {
        ModeKind::SegmentLayer => AcquisitionMode::SegmentLayer(SegmentLayerInput::default()),
        ModeKind::ManualEntry => AcquisitionMode::ManualEntry(Vec::new()),
        ModeKind::DemExtraction => AcquisitionMode::DemExtraction(DemInput {
            raster: None,
            features: Vec::new(),
            fields: DemFieldMapping::new("subbasin_id"),
            units: LinearUnit::Feet,
        }),
    }
}

// Input accumulated for the active acquisition mode
#[derive(Debug)]
pub struct AcquisitionSession {
    mode: AcquisitionMode,
}

impl AcquisitionSession {
    pub fn new(kind: ModeKind) -> Self {
        AcquisitionSession {
            mode: empty_mode(kind),
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Select another mode. Anything accumulated so far is discarded, even
    /// when the mode does not change.
    pub fn switch_mode(&mut self, kind: ModeKind) {
        let discarded = self.pending();
        if discarded > 0 {
            info!(
                "switching from {} to {} mode, discarding {} pending inputs",
                self.kind(),
                kind,
                discarded
            );
        }
        self.mode = empty_mode(kind);
    }

    fn mismatch(&self, expected: ModeKind) -> TcError {
        TcError::ModeMismatch {
            expected: expected.to_string(),
            actual: self.kind().to_string(),
        }
    }

    pub fn push_segment(&mut self, row: SegmentRow) -> Result<()> {
        match &mut self.mode {
            AcquisitionMode::SegmentLayer(input) => {
                input.rows.push(row);
                Ok(())
            }
            _ => Err(self.mismatch(ModeKind::SegmentLayer)),
        }
    }

    pub fn set_catchment_params(&mut self, catchment_id: &str, params: CatchmentParams) -> Result<()> {
        match &mut self.mode {
            AcquisitionMode::SegmentLayer(input) => {
                input.params.insert(catchment_id.to_string(), params);
                Ok(())
            }
            _ => Err(self.mismatch(ModeKind::SegmentLayer)),
        }
    }

    pub fn push_manual_row(&mut self, row: ManualEntryRow) -> Result<()> {
        match &mut self.mode {
            AcquisitionMode::ManualEntry(rows) => {
                rows.push(row);
                Ok(())
            }
            _ => Err(self.mismatch(ModeKind::ManualEntry)),
        }
    }

    pub fn set_raster(
        &mut self,
        raster: Box<dyn ElevationSource>,
        fields: DemFieldMapping,
        units: LinearUnit,
    ) -> Result<()> {
        match &mut self.mode {
            AcquisitionMode::DemExtraction(input) => {
                input.raster = Some(raster);
                input.fields = fields;
                input.units = units;
                Ok(())
            }
            _ => Err(self.mismatch(ModeKind::DemExtraction)),
        }
    }

    pub fn push_polygon(&mut self, feature: PolygonFeature) -> Result<()> {
        match &mut self.mode {
            AcquisitionMode::DemExtraction(input) => {
                input.features.push(feature);
                Ok(())
            }
            _ => Err(self.mismatch(ModeKind::DemExtraction)),
        }
    }

    /// Number of rows or polygons accumulated so far.
    pub fn pending(&self) -> usize {
        match &self.mode {
            AcquisitionMode::SegmentLayer(input) => input.rows.len(),
            AcquisitionMode::ManualEntry(rows) => rows.len(),
            AcquisitionMode::DemExtraction(input) => input.features.len(),
        }
    }

    pub fn mode(&self) -> &AcquisitionMode {
        &self.mode
    }

    pub fn into_mode(self) -> AcquisitionMode {
        self.mode
    }
}
