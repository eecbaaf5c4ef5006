//! Subprocess orchestration for the external simulator.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, warn};

use crate::error::{Result, SpiceRigError};
use crate::netlist::Document;
use crate::result::{read_log, read_run, RunResult};
use crate::runner::cache::RunCache;
use crate::runner::{DEFAULT_EXECUTABLE, DEFAULT_POLL_INTERVAL, DEFAULT_SIM_DIR, DEFAULT_TIMEOUT};

/// Configuration for the simulator runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path of the simulator executable.
    pub executable: PathBuf,
    /// Directory receiving netlists and their output artifacts.
    pub sim_dir: PathBuf,
    /// Deadline for one simulator invocation.
    pub timeout: Duration,
    /// Interval between child exit polls.
    pub poll_interval: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            sim_dir: PathBuf::from(DEFAULT_SIM_DIR),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RunnerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulator executable path.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Set the artifact directory.
    pub fn with_sim_dir(mut self, sim_dir: impl Into<PathBuf>) -> Self {
        self.sim_dir = sim_dir.into();
        self
    }

    /// Set the per-invocation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the exit-poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Drives the external simulator: writes the netlist, launches the batch
/// process, enforces the deadline, and reads the artifacts back.
pub struct SpiceRunner {
    config: RunnerConfig,
    cache: RunCache,
    name_map: HashMap<String, String>,
}

impl SpiceRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let cache = RunCache::new(config.sim_dir.clone());
        SpiceRunner {
            config,
            cache,
            name_map: HashMap::new(),
        }
    }

    /// Rename result fields after every read, e.g. `V(vout)` to `vout`.
    pub fn with_name_map(mut self, name_map: HashMap<String, String>) -> Self {
        self.name_map = name_map;
        self
    }

    /// Run one document through the simulator.
    ///
    /// A document already in the cache short-circuits to re-reading the
    /// prior run's artifacts: no subprocess, no `total_seconds`.
    /// Simulator trouble (launch failure, non-zero exit, timeout) comes
    /// back as a failed [`RunResult`] so a sweep can keep going; `Err` is
    /// reserved for local file problems.
    pub fn execute(&mut self, document: &Document) -> Result<RunResult> {
        if let Some(previous) = self.cache.lookup(document) {
            info!(netlist = %previous.display(), "cache hit, reusing artifacts");
            return read_run(previous, &self.name_map);
        }

        let started = Instant::now();
        fs::create_dir_all(&self.config.sim_dir)
            .map_err(|e| SpiceRigError::write(&self.config.sim_dir, e))?;
        let stem = format!("{}_{}", timestamp(), sanitize_title(document.title()));
        let netlist = self.config.sim_dir.join(format!("{}.net", stem));
        document.write_to(&netlist)?;

        info!(
            executable = %self.config.executable.display(),
            netlist = %netlist.display(),
            "launching simulator"
        );
        let mut child = match Command::new(&self.config.executable)
            .arg("-b")
            .arg("-Run")
            .arg(&netlist)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "simulator failed to launch");
                return Ok(RunResult::failed(vec![format!(
                    "failed to launch {}: {}",
                    self.config.executable.display(),
                    e
                )]));
            }
        };

        let deadline = Instant::now() + self.config.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!(timeout = ?self.config.timeout, "simulator timed out, killing");
                    child.kill().ok();
                    child.wait().ok();
                    return Ok(RunResult::timed_out(log_diagnostics(&netlist)));
                }
                Ok(None) => thread::sleep(self.config.poll_interval),
                Err(e) => {
                    child.kill().ok();
                    child.wait().ok();
                    return Ok(RunResult::failed(vec![format!(
                        "failed to poll simulator: {}",
                        e
                    )]));
                }
            }
        };

        if !status.success() {
            warn!(%status, "simulator exited with failure");
            return Ok(RunResult::failed(log_diagnostics(&netlist)));
        }

        let mut result = read_run(&netlist, &self.name_map)?;
        self.cache.record(document, netlist);
        result.total_seconds = Some(started.elapsed().as_secs_f64());
        Ok(result)
    }
}

/// Flatten whatever the simulator logged next to `netlist` into sorted
/// `key: value` lines. Best effort; a missing or unreadable log yields
/// nothing.
fn log_diagnostics(netlist: &Path) -> Vec<String> {
    let fields = match read_log(netlist.with_extension("log")) {
        Ok(fields) => fields,
        Err(_) => return Vec::new(),
    };
    let mut lines: Vec<String> = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    lines.sort();
    lines
}

/// Millisecond-resolution timestamp for artifact file stems.
fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H%M%S_%3f").to_string()
}

/// Make a document title usable as a file stem: spaces become
/// underscores, anything outside letters, digits, `_`, `-` and `.` is
/// dropped.
fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{FieldValue, RunStatus};

    fn doc() -> Document {
        Document::parse("* fake run\nR1 a b 1k\n.param RL=50\n.end")
    }

    fn config(dir: &Path, executable: impl Into<PathBuf>) -> RunnerConfig {
        RunnerConfig::new()
            .with_executable(executable)
            .with_sim_dir(dir.join("runs"))
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(10))
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).unwrap();
        path
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title(" NDR osc v2 "), "NDR_osc_v2");
        assert_eq!(sanitize_title("a/b:c*d?"), "abcd");
        assert_eq!(sanitize_title("keep-this.one"), "keep-this.one");
        assert_eq!(sanitize_title(""), "");
    }

    #[test]
    fn test_timestamp_has_millisecond_stem_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), 21);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "_");
        assert_eq!(&ts[17..18], "_");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let exe = write_script(dir.path(), "fail.sh", "exit 3\n");
        let mut runner = SpiceRunner::new(config(dir.path(), exe));

        let result = runner.execute(&doc()).unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.fields.is_empty());
        assert_eq!(result.total_seconds, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_executable_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = SpiceRunner::new(config(dir.path(), dir.path().join("no-such.exe")));

        let result = runner.execute(&doc()).unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result
            .diagnostics
            .iter()
            .any(|line| line.contains("failed to launch")));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let exe = write_script(dir.path(), "hang.sh", "sleep 30\n");
        let cfg = config(dir.path(), exe).with_timeout(Duration::from_millis(100));
        let mut runner = SpiceRunner::new(cfg);

        let started = Instant::now();
        let result = runner.execute(&doc()).unwrap();
        assert_eq!(result.status, RunStatus::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_reads_artifacts_and_caches() {
        let raw_header = "Title: * fake run\n\
            No. Variables: 2\n\
            No. Points: 2\n\
            Variables:\n\
            \t0\ttime\ttime\n\
            \t1\tV(out)\tvoltage\n\
            Binary:\n";
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("fixtures");
        fs::create_dir_all(&fixtures).unwrap();
        fs::write(
            fixtures.join("out.raw"),
            crate::result::encode_raw(raw_header, &[(1e-9, vec![0.1]), (2e-9, vec![0.2])]),
        )
        .unwrap();
        fs::write(
            fixtures.join("out.log"),
            crate::encoding::to_utf16le("solver: Normal\nTotal elapsed time: 1.5 seconds.\n"),
        )
        .unwrap();

        // stands in for the simulator: drops artifacts next to the
        // netlist it was handed and counts its invocations
        let body = format!(
            "base=\"${{3%.net}}\"\n\
             cp \"{fixtures}/out.raw\" \"$base.raw\"\n\
             cp \"{fixtures}/out.log\" \"$base.log\"\n\
             echo run >> \"{fixtures}/invocations\"\n",
            fixtures = fixtures.display()
        );
        let exe = write_script(dir.path(), "fake-spice.sh", &body);
        let mut runner = SpiceRunner::new(config(dir.path(), exe));

        let first = runner.execute(&doc()).unwrap();
        assert!(first.is_success());
        assert!(first.total_seconds.is_some());
        assert_eq!(
            first.fields.get("solver"),
            Some(&FieldValue::Text("Normal".to_string()))
        );
        assert_eq!(first.fields.get("sim_time"), Some(&FieldValue::Real(1.5)));
        assert_eq!(first.fields.get("RL"), Some(&FieldValue::Integer(50)));

        let second = runner.execute(&doc()).unwrap();
        assert!(second.is_success());
        assert_eq!(second.total_seconds, None);
        assert_eq!(second.fields, first.fields);

        let invocations = fs::read_to_string(fixtures.join("invocations")).unwrap();
        assert_eq!(invocations.lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_run_does_not_poison_retries() {
        // a failed run leaves its netlist in the artifact directory; a
        // later run of the same document must re-invoke the simulator
        // rather than cache-hit on the netlist and choke on the missing
        // waveform
        let raw_header = "Title: * fake run\n\
            No. Variables: 2\n\
            No. Points: 1\n\
            Variables:\n\
            \t0\ttime\ttime\n\
            \t1\tV(out)\tvoltage\n\
            Binary:\n";
        let dir = tempfile::tempdir().unwrap();
        let fixtures = dir.path().join("fixtures");
        fs::create_dir_all(&fixtures).unwrap();
        fs::write(
            fixtures.join("out.raw"),
            crate::result::encode_raw(raw_header, &[(1e-9, vec![0.1])]),
        )
        .unwrap();
        fs::write(fixtures.join("out.log"), "solver: Normal\n").unwrap();

        let failing = write_script(dir.path(), "fail.sh", "exit 3\n");
        let mut runner = SpiceRunner::new(config(dir.path(), failing));
        let first = runner.execute(&doc()).unwrap();
        assert_eq!(first.status, RunStatus::Failed);

        let body = format!(
            "base=\"${{3%.net}}\"\n\
             cp \"{fixtures}/out.raw\" \"$base.raw\"\n\
             cp \"{fixtures}/out.log\" \"$base.log\"\n",
            fixtures = fixtures.display()
        );
        let working = write_script(dir.path(), "fake-spice.sh", &body);
        let mut runner = SpiceRunner::new(config(dir.path(), working));
        let second = runner.execute(&doc()).unwrap();
        assert!(second.is_success());
        assert_eq!(second.fields.get("time"), Some(&FieldValue::Real(1e-9)));
    }
}
