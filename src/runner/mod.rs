//! Run orchestration: cache, subprocess control, sweeps.
//!
//! [`SpiceRunner`] owns the only mutable state in the crate (the run
//! cache and the artifact directory) and drives the external simulator
//! one blocking invocation at a time:
//!
//! 1. look the document up in the content-addressed [`RunCache`];
//! 2. on a miss, write `{timestamp}_{title}.net` into the artifact
//!    directory and launch `{executable} -b -Run {netlist}`;
//! 3. poll for exit until the deadline, killing the child when it passes;
//! 4. read the sibling artifacts back into a
//!    [`RunResult`](crate::result::RunResult).

mod cache;
mod process;
mod sweep;

pub use cache::{recent_file, RunCache};
pub use process::{RunnerConfig, SpiceRunner};
pub use sweep::linspace;

use std::time::Duration;

/// Default install path of the simulator executable.
pub const DEFAULT_EXECUTABLE: &str = r"C:\Program Files\LTC\LTspiceXVII\XVIIx64.exe";

/// Default artifact directory, relative to the working directory.
pub const DEFAULT_SIM_DIR: &str = "spice_runs";

/// Default per-invocation deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default interval between child exit polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
