//! Text decoding for files written by the external simulator.
//!
//! The simulator writes its log and echoed-netlist files in whatever
//! encoding it feels like using (UTF-8, Windows-1252, or UTF-16LE without a
//! BOM, apparently keyed off the characters present in the GUI session), so
//! every text artifact is decoded through [`decode_auto`] rather than
//! assumed to be UTF-8.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, WINDOWS_1252};

/// How many leading bytes the UTF-16 heuristic inspects.
const SNIFF_LEN: usize = 256;

/// Decode bytes of unknown encoding into a `String`.
///
/// Detection order:
/// 1. a UTF-8/UTF-16 BOM, if present;
/// 2. NUL-byte distribution over the first [`SNIFF_LEN`] bytes (ASCII-heavy
///    UTF-16 text has a NUL in every other position);
/// 3. strict UTF-8;
/// 4. Windows-1252 (the tool is a Windows program; this decode cannot fail).
pub fn decode_auto(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(bytes);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

/// Detect BOM-less UTF-16 by NUL distribution.
///
/// For ASCII-dominated text, UTF-16LE places NULs at odd offsets and
/// UTF-16BE at even offsets. Requires NULs in at least a quarter of the
/// sniffed code units before committing, so binary-free UTF-8 never
/// matches.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(SNIFF_LEN)];
    if window.len() < 4 {
        return None;
    }

    let mut even_nuls = 0usize;
    let mut odd_nuls = 0usize;
    for (i, &b) in window.iter().enumerate() {
        if b == 0 {
            if i % 2 == 0 {
                even_nuls += 1;
            } else {
                odd_nuls += 1;
            }
        }
    }

    let threshold = window.len() / 4;
    if odd_nuls > threshold && odd_nuls > even_nuls * 2 {
        Some(UTF_16LE)
    } else if even_nuls > threshold && even_nuls > odd_nuls * 2 {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Encode a string as UTF-16LE bytes (used by tests to build synthetic
/// simulator artifacts).
#[cfg(test)]
pub fn to_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}
