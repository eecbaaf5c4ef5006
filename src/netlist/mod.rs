//! Netlist construction and editing.
//!
//! This module models the external simulator's line-oriented input
//! language and the editing rules used to mutate a netlist between runs.
//!
//! A netlist is an ordered sequence of statements; each line is classified
//! by its first token ([`DirectiveKind`]) and carries a comparison key
//! ([`Statement::match_key`]). Editing goes through [`Document::insert`],
//! which scores the new statement's key against every existing line and
//! either replaces the best match in place (same key, e.g. a re-defined
//! parameter) or splices the new line in right after its most similar
//! neighbor.
//!
//! # Example
//!
//! ```
//! use spicerig_core::netlist::{param, transient, Document};
//!
//! let base = Document::parse("* rc filter\nR1 in out 1k\n.param RL=50\n.end");
//! let run = base
//!     .insert(param("RL", 75))
//!     .insert(transient("1u", 0, "1n", false));
//! assert!(run.to_string().contains(".PARAM RL=75"));
//! assert!(!run.to_string().contains("RL=50"));
//! ```

mod builder;
mod document;
mod statement;
mod waveform;

pub use builder::{element, func, initial_condition, param, transient};
pub use document::{Document, IntoStatements};
pub use statement::{DirectiveKind, Statement};
pub use waveform::{Pulse, Pwl, Sine};
