//! # Spicerig Core
//!
//! A batch-scripting harness around an external, GUI-oriented SPICE
//! simulator. The simulator itself is a closed third-party executable;
//! this library automates everything around it so parameter studies can
//! run unattended.
//!
//! This library provides:
//! - A line-oriented netlist model with replace-vs-insert merge rules
//! - Constructors for parameter, element, and analysis statements and
//!   for source waveform expressions
//! - Readers for the simulator's binary waveform, log, and echoed
//!   netlist artifacts
//! - A content-addressed cache that skips re-running known documents
//! - A subprocess runner with a hard deadline, plus sweep loops
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`netlist`] - statement model, merge engine, statement builders
//! - [`result`] - artifact readers and the typed run record
//! - [`runner`] - run cache, subprocess orchestration, parameter sweeps
//! - [`encoding`] - encoding detection for the tool's text output
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use spicerig_core::netlist::{param, Document};
//! use spicerig_core::runner::{RunnerConfig, SpiceRunner};
//!
//! fn main() -> spicerig_core::Result<()> {
//!     let base = Document::from_file("ndr_osc.net")?;
//!     let config = RunnerConfig::new()
//!         .with_sim_dir("spice_runs")
//!         .with_timeout(Duration::from_secs(120));
//!     let mut runner = SpiceRunner::new(config);
//!
//!     let result = runner.execute(&base.insert(param("RL", 75)))?;
//!     println!("{:?}", result.fields.get("sim_time"));
//!     Ok(())
//! }
//! ```

pub mod encoding;
pub mod error;
pub mod netlist;
pub mod result;
pub mod runner;

// Re-export main types for convenience
pub use error::{Result, SpiceRigError};
pub use netlist::{Document, Statement};
pub use result::{FieldValue, RunResult, RunStatus};
pub use runner::{RunnerConfig, SpiceRunner};
