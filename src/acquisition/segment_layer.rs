use crate::catchment::{CatchmentInput, CatchmentParams, CatchmentRecord, SegmentTc, SegmentTime};
use crate::config::TcConfig;
use crate::error::{Result, TcError};
use crate::hydraulics::GeometryTable;
use crate::travel_time::{
    DEFAULT_PIPE_N, DEFAULT_SEGMENT_N, FlowSegment, FlowType, MAX_SHEET_FLOW_LENGTH_FT,
    SegmentContext, SurfaceType, segment_travel_time,
};
use std::collections::HashMap;
use tracing::debug;

/// One flowpath feature as read from a segment layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRow {
    pub catchment_id: String,
    pub length_ft: f64,
    pub slope_pct: f64,
    pub mannings_n: Option<f64>,
    pub flow_type: String,
    pub surface: Option<String>,
}

impl SegmentRow {
    /// Resolve the free-form tags once, at the adapter boundary.
    pub fn to_segment(&self) -> FlowSegment {
        let flow_type = FlowType::from_tag(&self.flow_type);
        let default_n = match flow_type {
            FlowType::Pipe => DEFAULT_PIPE_N,
            _ => DEFAULT_SEGMENT_N,
        };
        FlowSegment {
            length_ft: self.length_ft,
            slope_pct: self.slope_pct,
            mannings_n: self.mannings_n.unwrap_or(default_n),
            flow_type,
            surface: self.surface.as_deref().and_then(SurfaceType::from_tag),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SegmentLayerInput {
    pub rows: Vec<SegmentRow>,
    pub params: HashMap<String, CatchmentParams>,
}

impl SegmentLayerInput {
    pub fn new(rows: Vec<SegmentRow>) -> Self {
        SegmentLayerInput {
            rows,
            params: HashMap::new(),
        }
    }
}

// Segments grouped by catchment, in first-seen order
fn group_segments(rows: &[SegmentRow]) -> Result<Vec<(String, Vec<FlowSegment>)>> {
    let mut groups: Vec<(String, Vec<FlowSegment>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let id = row.catchment_id.trim();
        if id.is_empty() {
            return Err(TcError::InvalidValue {
                field: "catchment_id".to_string(),
                value: row.catchment_id.clone(),
                row: row_idx + 1,
            });
        }
        let slot = *index.entry(id.to_string()).or_insert_with(|| {
            groups.push((id.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row.to_segment());
    }

    Ok(groups)
}

/// Build one record per catchment, summing segment travel times.
pub fn normalize(input: &SegmentLayerInput, config: &TcConfig) -> Result<Vec<CatchmentInput>> {
    if input.rows.is_empty() {
        return Err(TcError::EmptyInput("segment layer".to_string()));
    }

    let mut geometry = GeometryTable::new(config.channel_geometry);
    for (id, params) in &input.params {
        if let Some(g) = params.geometry {
            geometry.insert(id, g);
        }
    }

    let groups = group_segments(&input.rows)?;
    let mut inputs = Vec::with_capacity(groups.len());

    for (id, segments) in groups {
        let params = input.params.get(&id).cloned().unwrap_or_default();
        let local = geometry.lookup(&id);
        let ctx = SegmentContext {
            policy: &config.policy,
            p2_rainfall_in: config.p2_rainfall_in,
            channel_radius_ft: local
                .map(|g| g.channel_radius())
                .unwrap_or(config.default_hydraulic_radius_ft),
            pipe_diameter_ft: params
                .pipe_diameter_ft
                .or_else(|| local.map(|g| g.pipe_diameter_ft))
                .unwrap_or(config.default_pipe_diameter_ft),
            adjust_conveyance_slopes: config.apply_slope_adjustment,
        };

        let mut warnings = Vec::new();
        let mut details = Vec::with_capacity(segments.len());
        let mut total_tt = 0.0;
        let mut total_length = 0.0;
        let mut slope_length = 0.0;
        let mut weighted_slope = 0.0;

        for (i, seg) in segments.iter().enumerate() {
            let tt = segment_travel_time(seg, &ctx);
            debug!(
                "{} segment {}: {} L={} S={}% n={} -> {:.2} min",
                id, i + 1, seg.flow_type, seg.length_ft, seg.slope_pct, seg.mannings_n, tt
            );
            if tt <= 0.0 {
                warnings.push(format!(
                    "segment {} ({}) inactive: non-positive or non-finite length, slope or roughness",
                    i + 1,
                    seg.flow_type
                ));
            }
            if tt > 0.0 && seg.flow_type == FlowType::Sheet && seg.length_ft > MAX_SHEET_FLOW_LENGTH_FT {
                warnings.push(format!(
                    "segment {} sheet flow length {:.0} ft truncated to 300 ft",
                    i + 1,
                    seg.length_ft
                ));
            }
            total_tt += tt;
            if seg.length_ft.is_finite() && seg.length_ft > 0.0 {
                total_length += seg.length_ft;
                if seg.slope_pct.is_finite() {
                    slope_length += seg.length_ft;
                    weighted_slope += seg.slope_pct * seg.length_ft;
                }
            }
            details.push(SegmentTime {
                segment: seg.clone(),
                travel_time_min: tt,
            });
        }

        let (avg_slope, segment_tc) = if total_length > 0.0 {
            (
                if slope_length > 0.0 { weighted_slope / slope_length } else { 0.0 },
                Some(SegmentTc {
                    total_min: total_tt,
                    details,
                }),
            )
        } else {
            warnings.push("zero total flow length, segment TC undefined".to_string());
            (0.0, None)
        };

        let record = CatchmentRecord {
            id: id.clone(),
            total_length_ft: total_length,
            avg_slope_pct: avg_slope,
            curve_number: params.curve_number.unwrap_or(config.default_cn),
            runoff_coefficient: params.runoff_coefficient.unwrap_or(config.default_c),
            mannings_n_avg: params.mannings_n.unwrap_or(config.default_n),
            land_type: params.land_type.unwrap_or(config.default_land_type),
            segments: Some(segments),
            high_elevation_ft: None,
            low_elevation_ft: None,
            slope_policy_applied: false,
        };

        inputs.push(CatchmentInput {
            record,
            segment_tc,
            warnings,
            adjusted: false,
        });
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydraulics::ChannelGeometry;
    use crate::travel_time::{channel_flow_time, pipe_flow_time, shallow_concentrated_time, sheet_flow_time};
    use approx::assert_relative_eq;

    fn row(id: &str, flow: &str, length: f64, slope: f64, n: f64) -> SegmentRow {
        SegmentRow {
            catchment_id: id.to_string(),
            length_ft: length,
            slope_pct: slope,
            mannings_n: Some(n),
            flow_type: flow.to_string(),
            surface: None,
        }
    }

    fn sb001_rows() -> Vec<SegmentRow> {
        vec![
            row("SB-001", "SHEET", 100.0, 2.0, 0.24),
            row("SB-001", "SHALLOW_CONC", 800.0, 3.0, 0.05),
            row("SB-001", "CHANNEL", 1200.0, 1.5, 0.035),
        ]
    }

    #[test]
    fn segment_sum_has_no_cross_terms() {
        let config = TcConfig::default();
        let mut input = SegmentLayerInput::new(sb001_rows());
        let geometry = ChannelGeometry {
            depth_ft: 2.0,
            bottom_width_ft: 4.0,
            side_slope_h_per_v: 3.0,
            pipe_diameter_ft: 1.5,
        };
        input.params.insert(
            "SB-001".to_string(),
            CatchmentParams {
                geometry: Some(geometry),
                ..CatchmentParams::default()
            },
        );

        let out = normalize(&input, &config).unwrap();
        assert_eq!(out.len(), 1);
        let seg_tc = out[0].segment_tc.as_ref().unwrap();

        let p = config.policy;
        let expected = sheet_flow_time(100.0, 2.0, 0.24, 3.5, &p)
            + shallow_concentrated_time(800.0, 3.0, SurfaceType::Unpaved, &p)
            + channel_flow_time(1200.0, 1.5, 0.035, geometry.channel_radius(), Some(&p));
        assert_relative_eq!(seg_tc.total_min, expected, epsilon = 1e-12);
        let parts: f64 = seg_tc.details.iter().map(|d| d.travel_time_min).sum();
        assert_relative_eq!(seg_tc.total_min, parts, epsilon = 1e-12);
    }

    #[test]
    fn length_weighted_slope() {
        let out = normalize(&SegmentLayerInput::new(sb001_rows()), &TcConfig::default()).unwrap();
        let record = &out[0].record;
        assert_eq!(record.total_length_ft, 2100.0);
        assert_relative_eq!(
            record.avg_slope_pct,
            (100.0 * 2.0 + 800.0 * 3.0 + 1200.0 * 1.5) / 2100.0,
            epsilon = 1e-12
        );
        assert_eq!(record.curve_number, 75.0);
        assert_eq!(record.segments.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let rows = vec![
            row("B", "SHEET", 50.0, 1.0, 0.011),
            row("A", "CHANNEL", 500.0, 1.0, 0.035),
            row("B", "PIPE", 400.0, 0.8, 0.013),
        ];
        let out = normalize(&SegmentLayerInput::new(rows), &TcConfig::default()).unwrap();
        let ids: Vec<_> = out.iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(out[0].record.segments.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn non_finite_segment_is_inactive() {
        let rows = vec![
            row("A", "SHEET", f64::NAN, 2.0, 0.24),
            row("A", "CHANNEL", 500.0, 1.0, 0.035),
        ];
        let config = TcConfig::default();
        let out = normalize(&SegmentLayerInput::new(rows), &config).unwrap();
        let seg_tc = out[0].segment_tc.as_ref().unwrap();

        assert_eq!(seg_tc.details[0].travel_time_min, 0.0);
        let channel = channel_flow_time(
            500.0,
            1.0,
            0.035,
            config.default_hydraulic_radius_ft,
            Some(&config.policy),
        );
        assert_relative_eq!(seg_tc.total_min, channel, epsilon = 1e-12);
        assert_eq!(out[0].record.total_length_ft, 500.0);
        assert_eq!(out[0].record.avg_slope_pct, 1.0);
        assert!(out[0].warnings.iter().any(|w| w.starts_with("segment 1 (SHEET) inactive")));
        assert!(!out[0].warnings.iter().any(|w| w.contains("truncated")));
    }

    #[test]
    fn pipe_diameter_override_without_geometry() {
        let config = TcConfig::default();
        let mut input = SegmentLayerInput::new(vec![row("A", "PIPE", 400.0, 0.8, 0.013)]);
        input.params.insert(
            "A".to_string(),
            CatchmentParams {
                pipe_diameter_ft: Some(3.0),
                ..CatchmentParams::default()
            },
        );
        let out = normalize(&input, &config).unwrap();
        let tt = out[0].segment_tc.as_ref().unwrap().total_min;
        assert_relative_eq!(
            tt,
            pipe_flow_time(400.0, 0.8, Some(0.013), 3.0, Some(&config.policy)),
            epsilon = 1e-12
        );
        assert!(
            (tt - pipe_flow_time(400.0, 0.8, Some(0.013), config.default_pipe_diameter_ft, Some(&config.policy))).abs()
                > 0.1
        );
    }

    #[test]
    fn zero_length_catchment_has_undefined_tc() {
        let rows = vec![row("Z", "CHANNEL", 0.0, 1.0, 0.035)];
        let out = normalize(&SegmentLayerInput::new(rows), &TcConfig::default()).unwrap();
        assert!(out[0].segment_tc.is_none());
        assert!(out[0].warnings.iter().any(|w| w.contains("segment TC undefined")));
    }

    #[test]
    fn missing_roughness_and_unknown_tags() {
        let mut pipe = row("P", "PIPE", 400.0, 0.8, 0.0);
        pipe.mannings_n = None;
        let mut other = row("P", "ditch", 100.0, 1.0, 0.0);
        other.mannings_n = None;

        assert_eq!(pipe.to_segment().mannings_n, DEFAULT_PIPE_N);
        let seg = other.to_segment();
        assert_eq!(seg.flow_type, FlowType::Channel);
        assert_eq!(seg.mannings_n, DEFAULT_SEGMENT_N);
    }

    #[test]
    fn empty_layer_and_blank_ids_are_fatal() {
        let config = TcConfig::default();
        assert!(matches!(
            normalize(&SegmentLayerInput::default(), &config),
            Err(TcError::EmptyInput(_))
        ));
        let rows = vec![row("  ", "SHEET", 50.0, 1.0, 0.011)];
        assert!(matches!(
            normalize(&SegmentLayerInput::new(rows), &config),
            Err(TcError::InvalidValue { row: 1, .. })
        ));
    }
}
