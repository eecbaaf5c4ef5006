//! Simulator log reader.
//!
//! The log is loosely structured text (frequently UTF-16LE without a
//! BOM): diagnostics, solver chatter, and `key: value` lines mixed
//! freely. Every line that looks like a pair is harvested; everything
//! else is ignored.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::encoding::decode_auto;
use crate::error::{Result, SpiceRigError};
use crate::result::record::FieldValue;

/// The log line whose leading float becomes the `sim_time` field.
const ELAPSED_PREFIX: &str = "Total elapsed time";

/// Read a log file into a field map.
///
/// A pair line is `key: value`, `key= value`, or `key, value`: a
/// whitespace-free key, the first separator character, then a single
/// space before the value. Repeated keys coalesce into a
/// [`FieldValue::TextList`] in order of appearance; integer-looking
/// values become [`FieldValue::Integer`]. The `Total elapsed time` entry
/// is re-emitted as `sim_time` with its leading float parsed as seconds.
pub fn read_log(path: impl AsRef<Path>) -> Result<HashMap<String, FieldValue>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SpiceRigError::read(path, e))?;
    Ok(parse_log(&decode_auto(&bytes)))
}

fn parse_log(text: &str) -> HashMap<String, FieldValue> {
    let mut fields = HashMap::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(ELAPSED_PREFIX) {
            let value = rest.trim_start_matches(|c| matches!(c, ':' | '=' | ',')).trim();
            if let Some(seconds) = value.split_whitespace().next() {
                if let Ok(seconds) = seconds.parse::<f64>() {
                    fields.insert("sim_time".to_string(), FieldValue::Real(seconds));
                }
            }
            continue;
        }
        if let Some((key, value)) = split_pair(line) {
            add_field(&mut fields, key, value);
        }
    }
    fields
}

/// Split a pair line at its first separator. Lines whose would-be key
/// contains whitespace, or without a space after the separator, are not
/// pairs.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let at = line.find(|c| matches!(c, ':' | '=' | ','))?;
    let (key, rest) = line.split_at(at);
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    let value = rest[1..].strip_prefix(' ')?;
    Some((key, value))
}

fn add_field(fields: &mut HashMap<String, FieldValue>, key: &str, value: &str) {
    match fields.entry(key.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(log_value(value));
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            FieldValue::TextList(values) => values.push(value.to_string()),
            existing => {
                let first = match existing {
                    FieldValue::Integer(value) => value.to_string(),
                    FieldValue::Text(value) => std::mem::take(value),
                    ref other => format!("{:?}", other),
                };
                *existing = FieldValue::TextList(vec![first, value.to_string()]);
            }
        },
    }
}

/// Log values are integers or text; floats only occur inside derived
/// fields like `sim_time`.
fn log_value(text: &str) -> FieldValue {
    match text.parse::<i64>() {
        Ok(value) => FieldValue::Integer(value),
        Err(_) => FieldValue::Text(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::to_utf16le;

    const LOG: &str = "Circuit: * NDR oscillator\n\
        Direct Newton iteration for transient startup\n\
        WARNING: Node n1 is floating\n\
        WARNING: Timestep too small\n\
        solver: Normal\n\
        method: trap\n\
        threads: 4\n\
        Maximum thread count: 8\n\
        Total elapsed time: 12.446 seconds.\n";

    fn read(text: &str, utf16: bool) -> HashMap<String, FieldValue> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        if utf16 {
            fs::write(&path, to_utf16le(text)).unwrap();
        } else {
            fs::write(&path, text).unwrap();
        }
        read_log(&path).unwrap()
    }

    #[test]
    fn test_extracts_pairs_and_skips_prose() {
        let fields = read(LOG, false);
        assert_eq!(
            fields.get("Circuit"),
            Some(&FieldValue::Text("* NDR oscillator".to_string()))
        );
        assert_eq!(fields.get("solver"), Some(&FieldValue::Text("Normal".to_string())));
        assert_eq!(fields.get("threads"), Some(&FieldValue::Integer(4)));
        // prose lines and keys containing whitespace yield nothing
        assert_eq!(fields.get("Direct"), None);
        assert_eq!(fields.get("Maximum"), None);
        assert_eq!(fields.get("Maximum thread count"), None);
    }

    #[test]
    fn test_repeated_keys_coalesce_in_order() {
        let fields = read(LOG, false);
        assert_eq!(
            fields.get("WARNING"),
            Some(&FieldValue::TextList(vec![
                "Node n1 is floating".to_string(),
                "Timestep too small".to_string(),
            ]))
        );
    }

    #[test]
    fn test_repeated_integer_key_coalesces_as_text() {
        let fields = read("threads: 4\nthreads: 8\n", false);
        assert_eq!(
            fields.get("threads"),
            Some(&FieldValue::TextList(vec!["4".to_string(), "8".to_string()]))
        );
    }

    #[test]
    fn test_elapsed_time_becomes_sim_time() {
        let fields = read(LOG, false);
        assert_eq!(fields.get("sim_time"), Some(&FieldValue::Real(12.446)));
        assert_eq!(fields.get("Total"), None);
    }

    #[test]
    fn test_reads_utf16_logs() {
        let fields = read(LOG, true);
        assert_eq!(fields.get("method"), Some(&FieldValue::Text("trap".to_string())));
        assert_eq!(fields.get("sim_time"), Some(&FieldValue::Real(12.446)));
    }

    #[test]
    fn test_separator_variants() {
        let fields = read("a= 1\nb, two\nc:no space\n", false);
        assert_eq!(fields.get("a"), Some(&FieldValue::Integer(1)));
        assert_eq!(fields.get("b"), Some(&FieldValue::Text("two".to_string())));
        assert_eq!(fields.get("c"), None);
    }
}
