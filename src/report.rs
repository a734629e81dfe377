use crate::io::results::CatchmentResult;
use crate::methods::TcMethod;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodStats {
    pub method: TcMethod,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Counts and TC statistics over a whole run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub adjusted: usize,
    pub with_warnings: usize,
    /// Catchments that ended with no TC value at all.
    pub without_tc: usize,
    pub overall_min: Option<f64>,
    pub overall_max: Option<f64>,
    pub overall_avg: Option<f64>,
    pub per_method: Vec<MethodStats>,
}

fn min_max_avg(values: &[f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    Some((min, max, avg))
}

impl RunSummary {
    pub fn from_results(results: &[CatchmentResult], methods: &[TcMethod]) -> Self {
        let mut summary = RunSummary {
            processed: results.len(),
            adjusted: results.iter().filter(|r| r.adjusted).count(),
            with_warnings: results.iter().filter(|r| !r.warnings.is_empty()).count(),
            ..RunSummary::default()
        };

        let mut all = Vec::new();
        for result in results {
            let before = all.len();
            all.extend(result.all_tc_values());
            if all.len() == before {
                summary.without_tc += 1;
            }
        }
        if let Some((min, max, avg)) = min_max_avg(&all) {
            summary.overall_min = Some(min);
            summary.overall_max = Some(max);
            summary.overall_avg = Some(avg);
        }

        for &method in methods {
            let values: Vec<f64> = results.iter().filter_map(|r| r.tc_for(method)).collect();
            if let Some((min, max, avg)) = min_max_avg(&values) {
                summary.per_method.push(MethodStats {
                    method,
                    count: values.len(),
                    min,
                    max,
                    avg,
                });
            }
        }

        summary
    }

    /// Multi-line breakdown for console output.
    pub fn detail(&self) -> String {
        let mut out = format!("{}", self);
        if let (Some(min), Some(max), Some(avg)) = (self.overall_min, self.overall_max, self.overall_avg) {
            out.push_str(&format!(
                "\n  TC range: {:.1} - {:.1} min (avg {:.1} min)",
                min, max, avg
            ));
        }
        for stats in &self.per_method {
            out.push_str(&format!(
                "\n  {:<8} n={:<4} min {:>7.2}  max {:>7.2}  avg {:>7.2}",
                stats.method.name(),
                stats.count,
                stats.min,
                stats.max,
                stats.avg
            ));
        }
        if self.without_tc > 0 {
            out.push_str(&format!("\n  {} catchments produced no TC", self.without_tc));
        }
        out
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} catchments processed, {} with adjustments, {} with warnings",
            self.processed, self.adjusted, self.with_warnings
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::results::TcResult;

    fn result(id: &str, values: &[(TcMethod, f64)], warnings: usize) -> CatchmentResult {
        let mut r = CatchmentResult::new(id, 1000.0, 1.0);
        for &(method, tc) in values {
            r.methods.push(TcResult {
                method,
                tc_minutes: tc,
                raw_tc_minutes: tc,
                minimum_applied: false,
                warnings: Vec::new(),
            });
        }
        r.warnings = vec!["w".to_string(); warnings];
        r
    }

    #[test]
    fn counts_and_stats() {
        let mut a = result("A", &[(TcMethod::Kirpich, 10.0), (TcMethod::Kerby, 30.0)], 0);
        a.adjusted = true;
        let b = result("B", &[(TcMethod::Kirpich, 20.0)], 2);
        let c = result("C", &[], 1);

        let summary = RunSummary::from_results(&[a, b, c], &TcMethod::ALL);
        assert_eq!(
            summary.to_string(),
            "3 catchments processed, 1 with adjustments, 2 with warnings"
        );
        assert_eq!(summary.without_tc, 1);
        assert_eq!(summary.overall_min, Some(10.0));
        assert_eq!(summary.overall_max, Some(30.0));
        assert_eq!(summary.overall_avg, Some(20.0));
        assert_eq!(summary.per_method.len(), 2);
        assert_eq!(summary.per_method[0].method, TcMethod::Kirpich);
        assert_eq!(summary.per_method[0].avg, 15.0);
        assert_eq!(summary.per_method[1].count, 1);
    }

    #[test]
    fn empty_run() {
        let summary = RunSummary::from_results(&[], &TcMethod::ALL);
        assert_eq!(summary.processed, 0);
        assert!(summary.overall_avg.is_none());
        assert!(summary.per_method.is_empty());
    }
}
