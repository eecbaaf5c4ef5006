//! Simulator output artifacts.
//!
//! A run leaves three sibling files sharing one stem: the binary waveform
//! trace (`.raw`), the text log (`.log`), and the echoed input netlist
//! (`.net`). [`read_run`] parses all three and merges them into a single
//! [`RunResult`].

use std::collections::HashMap;
use std::path::Path;

mod log;
mod raw;
mod record;

pub use log::read_log;
pub use raw::read_raw;
pub use record::{FieldValue, RunResult, RunStatus};

#[cfg(test)]
pub(crate) use raw::encode_raw;

use crate::error::Result;
use crate::netlist::Document;

/// Log keys copied into the merged field map.
const LOG_FIELDS: [&str; 4] = ["sim_time", "solver", "method", "WARNING"];

/// Read one run's artifacts, given any of the three sibling paths (the
/// other two are derived by extension swap).
///
/// Fields merge in this order, later sources overwriting earlier ones on
/// a name collision: waveform header tags and columns, then the echoed
/// netlist (the full line list under `netlist`, plus one field per
/// parameter), then the selected log scalars. The rename table is applied
/// last: every field named by a key moves to that key's value.
pub fn read_run(
    path: impl AsRef<Path>,
    name_map: &HashMap<String, String>,
) -> Result<RunResult> {
    let path = path.as_ref();
    let mut fields = read_raw(path.with_extension("raw"))?;

    let document = Document::from_file(path.with_extension("net"))?;
    let lines = document
        .statements()
        .iter()
        .map(|s| s.text().to_string())
        .collect();
    fields.insert("netlist".to_string(), FieldValue::TextList(lines));
    for (name, value) in document.params() {
        fields.insert(name, value);
    }

    let log = read_log(path.with_extension("log"))?;
    for key in LOG_FIELDS {
        if let Some(value) = log.get(key) {
            fields.insert(key.to_string(), value.clone());
        }
    }

    for (old, new) in name_map {
        if let Some(value) = fields.remove(old) {
            fields.insert(new.clone(), value);
        }
    }

    Ok(RunResult::completed(fields))
}
