use crate::catchment::{CatchmentInput, CatchmentRecord};
use crate::config::TcConfig;
use crate::error::{Result, TcError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One row of the manual-entry table. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEntryRow {
    pub subbasin_id: String,
    pub length_ft: f64,
    pub slope_pct: f64,
    pub cn: f64,
    pub c_value: f64,
    pub mannings_n: f64,
}

impl ManualEntryRow {
    pub fn to_record(&self, config: &TcConfig) -> CatchmentRecord {
        CatchmentRecord {
            id: self.subbasin_id.clone(),
            total_length_ft: self.length_ft,
            avg_slope_pct: self.slope_pct,
            curve_number: self.cn,
            runoff_coefficient: self.c_value,
            mannings_n_avg: self.mannings_n,
            land_type: config.default_land_type,
            segments: None,
            high_elevation_ft: None,
            low_elevation_ft: None,
            slope_policy_applied: false,
        }
    }

    pub fn from_record(record: &CatchmentRecord) -> Self {
        ManualEntryRow {
            subbasin_id: record.id.clone(),
            length_ft: record.total_length_ft,
            slope_pct: record.avg_slope_pct,
            cn: record.curve_number,
            c_value: record.runoff_coefficient,
            mannings_n: record.mannings_n_avg,
        }
    }
}

/// Manual rows map one-to-one onto records; no segment TC is produced.
pub fn normalize(rows: &[ManualEntryRow], config: &TcConfig) -> Result<Vec<CatchmentInput>> {
    if rows.is_empty() {
        return Err(TcError::EmptyInput("manual entry table".to_string()));
    }

    let mut seen = HashSet::new();
    let mut inputs = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let id = row.subbasin_id.trim();
        if id.is_empty() {
            return Err(TcError::InvalidValue {
                field: "subbasin_id".to_string(),
                value: row.subbasin_id.clone(),
                row: i + 1,
            });
        }
        if !seen.insert(id.to_string()) {
            return Err(TcError::DuplicateId(id.to_string()));
        }
        let mut input = CatchmentInput::new(row.to_record(config));
        input.warnings.push("segment TC unavailable in manual entry mode".to_string());
        inputs.push(input);
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> ManualEntryRow {
        ManualEntryRow {
            subbasin_id: id.to_string(),
            length_ft: 2100.0,
            slope_pct: 2.0,
            cn: 75.0,
            c_value: 0.42,
            mannings_n: 0.10,
        }
    }

    #[test]
    fn rows_become_records() {
        let config = TcConfig::default();
        let out = normalize(&[row("SB-001"), row("SB-002")], &config).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].segment_tc.is_none());
        assert!(out[0].record.segments.is_none());
        assert_eq!(out[1].record.id, "SB-002");
        assert_eq!(ManualEntryRow::from_record(&out[0].record), row("SB-001"));
    }

    #[test]
    fn duplicates_and_empty_tables_are_fatal() {
        let config = TcConfig::default();
        assert!(matches!(normalize(&[], &config), Err(TcError::EmptyInput(_))));
        assert!(matches!(
            normalize(&[row("A"), row("A")], &config),
            Err(TcError::DuplicateId(id)) if id == "A"
        ));
    }
}
