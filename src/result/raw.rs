//! Binary waveform artifact reader.
//!
//! The external simulator writes its traces as a three-section binary
//! file: a UTF-16LE header of `Tag: value` lines, a tab-delimited
//! variable table, and a packed data section. The two text sections are
//! each terminated by a sentinel line. Everything lands in one field map,
//! header tags and data columns alike.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::UTF_16LE;
use tracing::debug;

use crate::error::{Result, SpiceRigError};
use crate::result::record::FieldValue;

const ARTIFACT: &str = "waveform";
const HEADER_SENTINEL: &str = "Variables:";
const DATA_SENTINEL: &str = "Binary";

/// Read a waveform artifact into a field map: one entry per header tag
/// plus one per data column. Columns become [`FieldValue::Series`], except
/// that a single-point column collapses to a [`FieldValue::Real`] scalar.
pub fn read_raw(path: impl AsRef<Path>) -> Result<HashMap<String, FieldValue>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| SpiceRigError::read(path, e))?;
    parse_raw(&bytes, path)
}

fn parse_raw(bytes: &[u8], path: &Path) -> Result<HashMap<String, FieldValue>> {
    let mut lines = Utf16Lines::new(bytes);
    let mut fields = HashMap::new();

    loop {
        let line = lines.next_line().ok_or_else(|| {
            SpiceRigError::parse(
                ARTIFACT,
                path,
                format!("'{}' sentinel not found", HEADER_SENTINEL),
            )
        })?;
        if line.starts_with(HEADER_SENTINEL) {
            break;
        }
        if let Some((tag, value)) = line.split_once(':') {
            fields.insert(tag.trim().to_string(), header_value(value.trim()));
        }
    }

    let variables = read_variable_table(&mut lines, path)?;
    let declared = required_count(&fields, "No. Variables", path)?;
    if variables.len() != declared {
        return Err(SpiceRigError::parse(
            ARTIFACT,
            path,
            format!(
                "variable table lists {} names, header declares {}",
                variables.len(),
                declared
            ),
        ));
    }
    let points = required_count(&fields, "No. Points", path)?;

    read_data_section(lines.rest(), &variables, points, path, &mut fields)?;
    debug!(
        path = %path.display(),
        variables = variables.len(),
        points,
        "read waveform artifact"
    );
    Ok(fields)
}

/// Frames UTF-16LE text lines over the artifact bytes. A line runs up to
/// the next `0x0A` byte; the byte after it is the high half of the
/// two-byte newline and is skipped with it.
struct Utf16Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Utf16Lines<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Utf16Lines { bytes, pos: 0 }
    }

    fn next_line(&mut self) -> Option<String> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != 0x0A {
            self.pos += 1;
        }
        let line = &self.bytes[start..self.pos];
        self.pos = (self.pos + 2).min(self.bytes.len());
        let (text, _) = UTF_16LE.decode_without_bom_handling(line);
        Some(text.into_owned())
    }

    /// Bytes after the last framed line.
    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

/// Header tag values that look like unsigned integers become `Integer`,
/// everything else stays text.
fn header_value(text: &str) -> FieldValue {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = text.parse::<i64>() {
            return FieldValue::Integer(value);
        }
    }
    FieldValue::Text(text.to_string())
}

fn required_count(
    fields: &HashMap<String, FieldValue>,
    tag: &str,
    path: &Path,
) -> Result<usize> {
    match fields.get(tag) {
        Some(FieldValue::Integer(count)) => Ok(*count as usize),
        _ => Err(SpiceRigError::parse(
            ARTIFACT,
            path,
            format!("missing '{}' header tag", tag),
        )),
    }
}

/// Column names from the `index<TAB>name<TAB>unit` rows, in order.
fn read_variable_table(lines: &mut Utf16Lines<'_>, path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    loop {
        let line = lines.next_line().ok_or_else(|| {
            SpiceRigError::parse(
                ARTIFACT,
                path,
                format!("'{}' sentinel not found", DATA_SENTINEL),
            )
        })?;
        if line.starts_with(DATA_SENTINEL) {
            return Ok(names);
        }
        let mut columns = line.split_whitespace();
        match (columns.next(), columns.next()) {
            (Some(_index), Some(name)) => names.push(name.to_string()),
            _ => {
                return Err(SpiceRigError::parse(
                    ARTIFACT,
                    path,
                    format!("malformed variable row '{}'", line.trim()),
                ))
            }
        }
    }
}

/// Decode the packed samples: per point, one 8-byte float for the time
/// column followed by a 4-byte float per remaining column.
fn read_data_section(
    payload: &[u8],
    variables: &[String],
    points: usize,
    path: &Path,
    fields: &mut HashMap<String, FieldValue>,
) -> Result<()> {
    let record = if variables.is_empty() {
        0
    } else {
        8 + 4 * (variables.len() - 1)
    };
    let expected = points * record;
    if payload.len() != expected {
        return Err(SpiceRigError::PayloadMismatch {
            path: path.display().to_string(),
            points,
            vars: variables.len(),
            expected,
            found: payload.len(),
        });
    }

    let truncated =
        |_| SpiceRigError::parse(ARTIFACT, path, "data section ended mid-record".to_string());
    let mut cursor = Cursor::new(payload);
    let mut columns: Vec<Vec<f64>> = variables.iter().map(|_| Vec::with_capacity(points)).collect();
    for _ in 0..points {
        let mut remaining = columns.iter_mut();
        if let Some(time) = remaining.next() {
            // the tool occasionally flips the sign of the time column
            time.push(cursor.read_f64::<LittleEndian>().map_err(truncated)?.abs());
        }
        for column in remaining {
            column.push(f64::from(cursor.read_f32::<LittleEndian>().map_err(truncated)?));
        }
    }

    for (name, samples) in variables.iter().zip(columns) {
        let value = if samples.len() == 1 {
            FieldValue::Real(samples[0])
        } else {
            FieldValue::Series(samples)
        };
        fields.insert(name.clone(), value);
    }
    Ok(())
}

/// Assemble artifact bytes from header text and sample rows, for tests
/// across the crate.
#[cfg(test)]
pub(crate) fn encode_raw(header: &str, rows: &[(f64, Vec<f32>)]) -> Vec<u8> {
    let mut bytes = crate::encoding::to_utf16le(header);
    for (time, others) in rows {
        bytes.extend(time.to_le_bytes());
        for value in others {
            bytes.extend(value.to_le_bytes());
        }
    }
    bytes
}
