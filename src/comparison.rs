//! Runs the selected TC methods over every normalized catchment.

use crate::acquisition::{AcquisitionMode, ModeKind};
use crate::catchment::{CatchmentInput, CatchmentRecord, SegmentTc};
use crate::config::TcConfig;
use crate::error::Result;
use crate::io::results::{CatchmentResult, TcResult};
use crate::report::RunSummary;
use crate::travel_time::simplified_velocity_tc;
use std::fmt;
use tracing::{info, warn};

/// Problems that stop one catchment from being evaluated. The rest of the
/// batch is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    NonPositiveLength(f64),
    NonFinite { field: &'static str, value: f64 },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::NonPositiveLength(len) => {
                write!(f, "flow length {} ft is not positive, catchment skipped", len)
            }
            RecordError::NonFinite { field, value } => {
                write!(f, "{} is not a finite number ({}), catchment skipped", field, value)
            }
        }
    }
}

impl std::error::Error for RecordError {}

fn validate(record: &CatchmentRecord) -> std::result::Result<(), RecordError> {
    if !record.total_length_ft.is_finite() {
        return Err(RecordError::NonFinite {
            field: "length",
            value: record.total_length_ft,
        });
    }
    if !record.avg_slope_pct.is_finite() {
        return Err(RecordError::NonFinite {
            field: "slope",
            value: record.avg_slope_pct,
        });
    }
    if record.total_length_ft <= 0.0 {
        return Err(RecordError::NonPositiveLength(record.total_length_ft));
    }
    Ok(())
}

// Slope seen by the methods; the record itself is left untouched
fn effective_slope(record: &CatchmentRecord, config: &TcConfig, result: &mut CatchmentResult) -> f64 {
    if !config.apply_slope_adjustment || record.slope_policy_applied {
        return record.avg_slope_pct;
    }
    let adj = config.policy.adjust_slope(record.avg_slope_pct / 100.0);
    result.adjusted |= adj.was_adjusted;
    result.warnings.extend(adj.warning);
    adj.slope_ftft * 100.0
}

fn floor_segment_tc(
    segment_tc: &SegmentTc,
    record: &CatchmentRecord,
    config: &TcConfig,
    result: &mut CatchmentResult,
) -> SegmentTc {
    let mut out = segment_tc.clone();
    if config.apply_tc_minimum && segment_tc.total_min > 0.0 {
        let floor = config.policy.enforce_minimum_tc(segment_tc.total_min, record.land_type);
        if floor.was_adjusted {
            result.adjusted = true;
            out.total_min = floor.tc_minutes;
        }
        if let Some(w) = floor.warning {
            result.warnings.push(format!("segment TC: {}", w));
        }
    }
    out
}

/// Evaluate one catchment. Never fails: problems end up as warnings.
pub fn compare_catchment(input: &CatchmentInput, config: &TcConfig) -> CatchmentResult {
    let record = &input.record;
    let mut result = CatchmentResult::new(&record.id, record.total_length_ft, record.avg_slope_pct);
    result.warnings.extend(input.warnings.iter().cloned());
    result.adjusted = input.adjusted;

    if let Err(e) = validate(record) {
        result.warnings.push(e.to_string());
        return result;
    }

    let slope_pct = effective_slope(record, config, &mut result);
    result.slope_pct = slope_pct;
    let params = record.method_params();

    for method in config.methods() {
        let outcome = method.calculate(record.total_length_ft, slope_pct, &params);
        let mut warnings: Vec<String> = outcome
            .warnings
            .iter()
            .map(|w| format!("{}: {}", method.name(), w))
            .collect();

        if !(outcome.tc_minutes > 0.0) || !outcome.tc_minutes.is_finite() {
            result.warnings.extend(warnings);
            result
                .warnings
                .push(format!("{}: not applicable for this catchment", method.name()));
            continue;
        }

        let mut tc = outcome.tc_minutes;
        let mut minimum_applied = false;
        if config.apply_tc_minimum {
            let floor = config.policy.enforce_minimum_tc(tc, record.land_type);
            tc = floor.tc_minutes;
            minimum_applied = floor.was_adjusted;
            if let Some(w) = floor.warning {
                warnings.push(format!("{}: {}", method.name(), w));
            }
        }
        result.adjusted |= minimum_applied;
        result.warnings.extend(warnings.iter().cloned());
        result.methods.push(TcResult {
            method,
            tc_minutes: tc,
            raw_tc_minutes: outcome.tc_minutes,
            minimum_applied,
            warnings,
        });
    }

    if let Some(segment_tc) = &input.segment_tc {
        result.segment_tc = Some(floor_segment_tc(segment_tc, record, config, &mut result));
    }

    if config.estimate_velocity_tc && record.segments.is_none() {
        if let Some(estimate) = simplified_velocity_tc(
            record.total_length_ft,
            slope_pct,
            record.land_type,
            config.p2_rainfall_in,
            &config.policy,
        ) {
            let mut tc = estimate.total_min();
            if config.apply_tc_minimum {
                let floor = config.policy.enforce_minimum_tc(tc, record.land_type);
                if let Some(w) = floor.warning {
                    result.warnings.push(format!("velocity estimate: {}", w));
                }
                result.adjusted |= floor.was_adjusted;
                tc = floor.tc_minutes;
            }
            result.velocity_tc_min = Some(tc);
        }
    }

    result
}

/// Output of one run: per-catchment results, every warning, and the summary.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: ModeKind,
    pub results: Vec<CatchmentResult>,
    pub run_log: Vec<String>,
    pub summary: RunSummary,
}

pub fn compare_all<F>(inputs: &[CatchmentInput], config: &TcConfig, mut on_result: F) -> Vec<CatchmentResult>
where
    F: FnMut(&CatchmentResult),
{
    inputs
        .iter()
        .map(|input| {
            let result = compare_catchment(input, config);
            on_result(&result);
            result
        })
        .collect()
}

pub fn run(mode: &AcquisitionMode, config: &TcConfig) -> Result<RunReport> {
    run_with_progress(mode, config, |_| {})
}

/// Normalize the input, evaluate each catchment, and summarize.
/// `on_result` is called once per catchment, in input order.
pub fn run_with_progress<F>(mode: &AcquisitionMode, config: &TcConfig, on_result: F) -> Result<RunReport>
where
    F: FnMut(&CatchmentResult),
{
    let inputs = mode.normalize(config)?;
    info!("{} catchments from {} input", inputs.len(), mode.kind());

    let results = compare_all(&inputs, config, on_result);

    let mut run_log = Vec::new();
    for result in &results {
        for w in &result.warnings {
            warn!("{}: {}", result.catchment_id, w);
            run_log.push(format!("{}: {}", result.catchment_id, w));
        }
    }

    let summary = RunSummary::from_results(&results, &config.methods());
    info!("{}", summary);

    Ok(RunReport {
        mode: mode.kind(),
        results,
        run_log,
        summary,
    })
}
