use crate::acquisition::{ManualEntryRow, SegmentRow};
use crate::adjustment::LandType;
use crate::catchment::CatchmentParams;
use crate::config::{ColumnConfig, TcConfig};
use crate::error::{Result, TcError};
use crate::hydraulics::ChannelGeometry;
use crate::io::results::CatchmentResult;
use crate::methods::TcMethod;
use csv::{Reader, ReaderBuilder, StringRecord, Writer, WriterBuilder};
use std::collections::HashMap;
use std::io::{Read, Write};

fn reader<R: Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn writer<W: Write>(output: W) -> Writer<W> {
    WriterBuilder::new().has_headers(true).from_writer(output)
}

/// Position of the first header matching one of `aliases`, ignoring case.
fn find_column(headers: &StringRecord, aliases: &[String]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

fn require_column(headers: &StringRecord, aliases: &[String], source: &str) -> Result<usize> {
    find_column(headers, aliases).ok_or_else(|| TcError::MissingField {
        field: aliases.first().cloned().unwrap_or_default(),
        input_name: source.to_string(),
    })
}

// Column indices resolved once per file
struct Columns {
    id: usize,
    length: usize,
    slope: usize,
    mannings_n: Option<usize>,
}

fn text(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i)).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_required(record: &StringRecord, idx: usize, field: &str, row: usize) -> Result<f64> {
    let raw = record.get(idx).map(str::trim).unwrap_or("");
    raw.parse::<f64>().map_err(|_| TcError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
        row,
    })
}

fn parse_optional(record: &StringRecord, idx: Option<usize>, field: &str, row: usize) -> Result<Option<f64>> {
    match text(record, idx) {
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| TcError::InvalidValue {
            field: field.to_string(),
            value: raw.to_string(),
            row,
        }),
        None => Ok(None),
    }
}

fn id_text(record: &StringRecord, idx: usize, row: usize) -> Result<String> {
    text(record, Some(idx))
        .map(str::to_string)
        .ok_or_else(|| TcError::InvalidValue {
            field: "catchment_id".to_string(),
            value: String::new(),
            row,
        })
}

/// Read a manual-entry table. Length and slope columns are required; missing
/// CN, C or n columns (or blank cells) take the configured defaults.
pub fn read_manual_entries<R: Read>(
    input: R,
    columns: &ColumnConfig,
    config: &TcConfig,
) -> Result<Vec<ManualEntryRow>> {
    let source = "manual entry table";
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();

    let cols = Columns {
        id: require_column(&headers, &columns.catchment_id, source)?,
        length: require_column(&headers, &columns.length, source)?,
        slope: require_column(&headers, &columns.slope, source)?,
        mannings_n: find_column(&headers, &columns.mannings_n),
    };
    let cn_col = find_column(&headers, &columns.cn);
    let c_col = find_column(&headers, &columns.c_value);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        rows.push(ManualEntryRow {
            subbasin_id: id_text(&record, cols.id, row)?,
            length_ft: parse_required(&record, cols.length, "length_ft", row)?,
            slope_pct: parse_required(&record, cols.slope, "slope_pct", row)?,
            cn: parse_optional(&record, cn_col, "cn", row)?.unwrap_or(config.default_cn),
            c_value: parse_optional(&record, c_col, "c_value", row)?.unwrap_or(config.default_c),
            mannings_n: parse_optional(&record, cols.mannings_n, "mannings_n", row)?
                .unwrap_or(config.default_n),
        });
    }
    Ok(rows)
}

/// Write a manual-entry table with the canonical
/// `subbasin_id,length_ft,slope_pct,cn,c_value,mannings_n` header.
pub fn write_manual_entries<W: Write>(output: W, rows: &[ManualEntryRow]) -> Result<()> {
    let mut wtr = writer(output);
    if rows.is_empty() {
        wtr.write_record(["subbasin_id", "length_ft", "slope_pct", "cn", "c_value", "mannings_n"])?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a flow-path segment layer exported as CSV.
pub fn read_segment_rows<R: Read>(input: R, columns: &ColumnConfig) -> Result<Vec<SegmentRow>> {
    let source = "segment layer";
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();

    let cols = Columns {
        id: require_column(&headers, &columns.catchment_id, source)?,
        length: require_column(&headers, &columns.length, source)?,
        slope: require_column(&headers, &columns.slope, source)?,
        mannings_n: find_column(&headers, &columns.mannings_n),
    };
    let flow_col = require_column(&headers, &columns.flow_type, source)?;
    let surface_col = find_column(&headers, &columns.surface);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        rows.push(SegmentRow {
            catchment_id: id_text(&record, cols.id, row)?,
            length_ft: parse_required(&record, cols.length, "length_ft", row)?,
            slope_pct: parse_required(&record, cols.slope, "slope_pct", row)?,
            mannings_n: parse_optional(&record, cols.mannings_n, "mannings_n", row)?,
            flow_type: text(&record, Some(flow_col)).unwrap_or_default().to_string(),
            surface: text(&record, surface_col).map(str::to_string),
        });
    }
    Ok(rows)
}

/// Read per-catchment overrides. Channel geometry is taken only when depth,
/// bottom width and side slope are all present; a pipe diameter stands on
/// its own.
pub fn read_catchment_params<R: Read>(
    input: R,
    columns: &ColumnConfig,
    config: &TcConfig,
) -> Result<HashMap<String, CatchmentParams>> {
    let mut rdr = reader(input);
    let headers = rdr.headers()?.clone();

    let id_col = require_column(&headers, &columns.catchment_id, "catchment parameter table")?;
    let cn_col = find_column(&headers, &columns.cn);
    let c_col = find_column(&headers, &columns.c_value);
    let n_col = find_column(&headers, &columns.mannings_n);
    let land_col = find_column(&headers, &columns.land_type);
    let depth_col = find_column(&headers, &columns.channel_depth);
    let width_col = find_column(&headers, &columns.channel_width);
    let side_col = find_column(&headers, &columns.side_slope);
    let pipe_col = find_column(&headers, &columns.pipe_diameter);

    let mut params = HashMap::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let id = id_text(&record, id_col, row)?;

        let depth = parse_optional(&record, depth_col, "channel_depth", row)?;
        let width = parse_optional(&record, width_col, "channel_width", row)?;
        let side = parse_optional(&record, side_col, "side_slope", row)?;
        let pipe = parse_optional(&record, pipe_col, "pipe_diameter", row)?;
        let geometry = match (depth, width, side) {
            (Some(depth_ft), Some(bottom_width_ft), Some(side_slope_h_per_v)) => Some(ChannelGeometry {
                depth_ft,
                bottom_width_ft,
                side_slope_h_per_v,
                pipe_diameter_ft: pipe.unwrap_or(config.default_pipe_diameter_ft),
            }),
            _ => None,
        };

        let entry = CatchmentParams {
            curve_number: parse_optional(&record, cn_col, "cn", row)?,
            runoff_coefficient: parse_optional(&record, c_col, "c_value", row)?,
            mannings_n: parse_optional(&record, n_col, "mannings_n", row)?,
            land_type: text(&record, land_col).map(LandType::from_tag),
            geometry,
            pipe_diameter_ft: pipe,
        };
        if params.insert(id.clone(), entry).is_some() {
            return Err(TcError::DuplicateId(id));
        }
    }
    Ok(params)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_default()
}

/// One row per catchment, one column per selected method. Values are written
/// with fixed precision so identical runs produce identical files.
pub fn write_results<W: Write>(
    output: W,
    results: &[CatchmentResult],
    methods: &[TcMethod],
    include_velocity: bool,
) -> Result<()> {
    let mut wtr = writer(output);

    let mut header = vec![
        "catchment_id".to_string(),
        "length_ft".to_string(),
        "slope_pct".to_string(),
        "segment_tc_min".to_string(),
    ];
    header.extend(methods.iter().map(|m| format!("{}_min", m.id())));
    if include_velocity {
        header.push("velocity_tc_min".to_string());
    }
    header.push("warnings".to_string());
    wtr.write_record(&header)?;

    for result in results {
        let mut record = vec![
            result.catchment_id.clone(),
            format!("{:.1}", result.length_ft),
            format!("{:.3}", result.slope_pct),
            fmt_opt(result.segment_tc_min(), 2),
        ];
        record.extend(methods.iter().map(|&m| fmt_opt(result.tc_for(m), 2)));
        if include_velocity {
            record.push(fmt_opt(result.velocity_tc_min, 2));
        }
        record.push(result.warnings.join("; "));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// One row per flow segment, for catchments that have a segment TC.
pub fn write_segment_details<W: Write>(output: W, results: &[CatchmentResult]) -> Result<()> {
    let mut wtr = writer(output);
    wtr.write_record([
        "catchment_id",
        "flow_type",
        "length_ft",
        "slope_pct",
        "mannings_n",
        "travel_time_min",
    ])?;

    for result in results {
        let Some(segment_tc) = &result.segment_tc else {
            continue;
        };
        for detail in &segment_tc.details {
            let seg = &detail.segment;
            wtr.write_record(&[
                result.catchment_id.clone(),
                seg.flow_type.as_str().to_string(),
                format!("{:.1}", seg.length_ft),
                format!("{:.3}", seg.slope_pct),
                format!("{:.3}", seg.mannings_n),
                format!("{:.2}", detail.travel_time_min),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::manual;
    use crate::catchment::{SegmentTc, SegmentTime};
    use crate::io::results::TcResult;
    use crate::travel_time::{FlowSegment, FlowType};

    fn rows() -> Vec<ManualEntryRow> {
        vec![
            ManualEntryRow {
                subbasin_id: "SB-001".to_string(),
                length_ft: 2100.0,
                slope_pct: 2.0 / 3.0,
                cn: 75.0,
                c_value: 0.42,
                mannings_n: 0.1,
            },
            ManualEntryRow {
                subbasin_id: "SB-002".to_string(),
                length_ft: 1050.25,
                slope_pct: 1.1428571428571428,
                cn: 92.0,
                c_value: 0.78,
                mannings_n: 0.012,
            },
        ]
    }

    #[test]
    fn manual_table_round_trip() {
        let config = TcConfig::default();
        let mut buf = Vec::new();
        write_manual_entries(&mut buf, &rows()).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("subbasin_id,length_ft,slope_pct,cn,c_value,mannings_n\n"));

        let back = read_manual_entries(buf.as_slice(), &ColumnConfig::new(), &config).unwrap();
        assert_eq!(back, rows());

        let a = manual::normalize(&rows(), &config).unwrap();
        let b = manual::normalize(&back, &config).unwrap();
        let records_a: Vec<_> = a.iter().map(|i| &i.record).collect();
        let records_b: Vec<_> = b.iter().map(|i| &i.record).collect();
        assert_eq!(records_a, records_b);
    }

    #[test]
    fn alternate_headers_and_defaults() {
        let data = "ID,Length,Slope,CN\nA,1200,1.5,80\nB,900,2.0,\n";
        let config = TcConfig::default();
        let rows = read_manual_entries(data.as_bytes(), &ColumnConfig::new(), &config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].length_ft, 1200.0);
        assert_eq!(rows[0].cn, 80.0);
        assert_eq!(rows[1].cn, config.default_cn);
        assert_eq!(rows[1].c_value, config.default_c);
        assert_eq!(rows[1].mannings_n, config.default_n);
    }

    #[test]
    fn missing_and_bad_columns() {
        let config = TcConfig::default();
        let err = read_manual_entries("id,length\nA,10\n".as_bytes(), &ColumnConfig::new(), &config)
            .unwrap_err();
        assert!(matches!(err, TcError::MissingField { ref field, .. } if field == "slope_pct"));

        let err = read_manual_entries("id,length,slope\nA,ten,1\n".as_bytes(), &ColumnConfig::new(), &config)
            .unwrap_err();
        assert!(matches!(err, TcError::InvalidValue { row: 1, .. }));
    }

    #[test]
    fn segment_layer_csv() {
        let data = "subbasin_id,flow_type,length_ft,slope_pct,mannings_n,surface\n\
                    SB-001,SHEET,100,2.0,0.24,\n\
                    SB-001,SHALLOW_CONC,800,3.0,0.05,unpaved\n\
                    SB-001,CHANNEL,1200,1.5,,\n";
        let rows = read_segment_rows(data.as_bytes(), &ColumnConfig::new()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].flow_type, "SHEET");
        assert_eq!(rows[0].surface, None);
        assert_eq!(rows[1].surface.as_deref(), Some("unpaved"));
        assert_eq!(rows[2].mannings_n, None);

        let err = read_segment_rows("id,length,slope\nA,1,1\n".as_bytes(), &ColumnConfig::new()).unwrap_err();
        assert!(matches!(err, TcError::MissingField { .. }));
    }

    #[test]
    fn params_table() {
        let data = "subbasin_id,cn,c_value,mannings_n,land_type,channel_depth,channel_width,side_slope,pipe_diameter\n\
                    SB-001,75,0.42,0.10,rural,2.0,4.0,3.0,1.5\n\
                    SB-002,92,0.78,0.012,urban,,,,\n";
        let params = read_catchment_params(data.as_bytes(), &ColumnConfig::new(), &TcConfig::default()).unwrap();
        let sb1 = &params["SB-001"];
        assert_eq!(sb1.curve_number, Some(75.0));
        assert_eq!(sb1.land_type, Some(LandType::Rural));
        assert_eq!(sb1.geometry.unwrap().bottom_width_ft, 4.0);
        let sb2 = &params["SB-002"];
        assert_eq!(sb2.land_type, Some(LandType::Paved));
        assert!(sb2.geometry.is_none());
        assert!(sb2.pipe_diameter_ft.is_none());
    }

    #[test]
    fn pipe_diameter_without_channel_geometry() {
        let data = "subbasin_id,pipe_diameter\nA,3.0\n";
        let params = read_catchment_params(data.as_bytes(), &ColumnConfig::new(), &TcConfig::default()).unwrap();
        let a = &params["A"];
        assert!(a.geometry.is_none());
        assert_eq!(a.pipe_diameter_ft, Some(3.0));
    }

    fn sample_result() -> CatchmentResult {
        let mut r = CatchmentResult::new("SB-001", 2100.0, 2.0);
        r.methods.push(TcResult {
            method: TcMethod::Kirpich,
            tc_minutes: 12.3456,
            raw_tc_minutes: 12.3456,
            minimum_applied: false,
            warnings: Vec::new(),
        });
        r.segment_tc = Some(SegmentTc {
            total_min: 20.0,
            details: vec![SegmentTime {
                segment: FlowSegment::new(FlowType::Sheet, 100.0, 2.0, 0.24),
                travel_time_min: 20.0,
            }],
        });
        r.warnings = vec!["a".to_string(), "b".to_string()];
        r
    }

    #[test]
    fn results_table_layout() {
        let mut buf = Vec::new();
        write_results(&mut buf, &[sample_result()], &[TcMethod::Kirpich, TcMethod::Faa], true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("catchment_id,length_ft,slope_pct,segment_tc_min,kirpich_min,faa_min,velocity_tc_min,warnings")
        );
        assert_eq!(lines.next(), Some("SB-001,2100.0,2.000,20.00,12.35,,,a; b"));
    }

    #[test]
    fn segment_detail_rows() {
        let mut buf = Vec::new();
        write_segment_details(&mut buf, &[sample_result(), CatchmentResult::new("M", 1.0, 1.0)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "SB-001,SHEET,100.0,2.000,0.240,20.00");
    }
}
