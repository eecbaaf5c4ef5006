//! Sequential parameter sweeps.
//!
//! One simulator invocation at a time; the external tool does not take
//! kindly to concurrent instances.

use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::netlist::{param, Document};
use crate::result::RunResult;
use crate::runner::process::SpiceRunner;

impl SpiceRunner {
    /// Run `base` once per value, overriding one parameter each time.
    ///
    /// Simulator failures land in the output as failed results in
    /// position; only local file errors abort the sweep.
    pub fn run_sweep(
        &mut self,
        base: &Document,
        name: &str,
        values: &[f64],
    ) -> Result<Vec<RunResult>> {
        let mut results = Vec::with_capacity(values.len());
        for &value in values {
            info!(param = name, value, "sweep point");
            let document = base.clone().insert(param(name, value));
            results.push(self.execute(&document)?);
        }
        Ok(results)
    }

    /// Sweep every numeric parameter of `base` across
    /// `value * (1 ± relative_span)`, `points` runs per parameter.
    /// Parameters whose value is not numeric are skipped.
    pub fn vary_all(
        &mut self,
        base: &Document,
        relative_span: f64,
        points: usize,
    ) -> Result<HashMap<String, Vec<RunResult>>> {
        let mut sweeps = HashMap::new();
        for (name, value) in base.params() {
            let center = match value.as_f64() {
                Some(center) => center,
                None => continue,
            };
            let values = linspace(
                center * (1.0 - relative_span),
                center * (1.0 + relative_span),
                points,
            );
            let results = self.run_sweep(base, &name, &values)?;
            sweeps.insert(name, results);
        }
        Ok(sweeps)
    }
}

/// `count` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RunStatus;
    use crate::runner::RunnerConfig;
    use std::time::Duration;

    #[test]
    fn test_linspace_spans_inclusive_range() {
        assert_eq!(linspace(0.0, 10.0, 5), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(linspace(2.0, 1.0, 3), vec![2.0, 1.5, 1.0]);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
    }

    fn failing_runner(dir: &std::path::Path) -> SpiceRunner {
        // an executable that cannot launch: every run is contained as a
        // failed result, which is exactly what the sweep contract needs
        let config = RunnerConfig::new()
            .with_executable(dir.join("no-such-simulator"))
            .with_sim_dir(dir.join("runs"))
            .with_timeout(Duration::from_secs(1));
        SpiceRunner::new(config)
    }

    #[test]
    fn test_run_sweep_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let base = Document::parse("* sweep\nR1 a b 1k\n.param RL=50\n.end");

        let results = failing_runner(dir.path())
            .run_sweep(&base, "RL", &[40.0, 50.0, 60.0])
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.status == RunStatus::Failed));
    }

    #[test]
    fn test_vary_all_sweeps_only_numeric_params() {
        let dir = tempfile::tempdir().unwrap();
        let base = Document::parse("* sweep\n.param RL=50\n.param CAP=2.5\n.param TD=5n\n.end");

        let sweeps = failing_runner(dir.path()).vary_all(&base, 0.2, 2).unwrap();
        assert_eq!(sweeps.len(), 2);
        assert_eq!(sweeps.get("RL").map(Vec::len), Some(2));
        assert_eq!(sweeps.get("CAP").map(Vec::len), Some(2));
        assert!(!sweeps.contains_key("TD"));
    }
}
