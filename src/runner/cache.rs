//! Content-addressed cache of previous runs.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Result, SpiceRigError};
use crate::netlist::Document;

/// Index of already-simulated documents, keyed by content hash of their
/// canonical text, valued by the netlist file the run was written to.
///
/// Memory is never authoritative: a miss triggers one reconciliation scan
/// of the artifact directory for netlist files written by earlier
/// sessions before the lookup concludes there is truly no match. A hit
/// whose waveform artifact has gone missing (a failed or interrupted run
/// left only the netlist behind) is dropped and reported as a miss, so
/// re-running that document invokes the simulator again.
pub struct RunCache {
    dir: PathBuf,
    index: HashMap<String, PathBuf>,
}

impl RunCache {
    /// A cache over the given artifact directory, which does not need to
    /// exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        RunCache {
            dir: dir.into(),
            index: HashMap::new(),
        }
    }

    /// The netlist path of a previous completed run of `document`, if any.
    pub fn lookup(&mut self, document: &Document) -> Option<PathBuf> {
        let hash = content_hash(document);
        if !self.index.contains_key(&hash) {
            self.rescan();
        }
        match self.index.get(&hash) {
            Some(netlist) if netlist.with_extension("raw").is_file() => Some(netlist.clone()),
            Some(netlist) => {
                debug!(netlist = %netlist.display(), "dropping cache entry without artifacts");
                self.index.remove(&hash);
                None
            }
            None => None,
        }
    }

    /// Associate `document` with the netlist file it was written to.
    pub fn record(&mut self, document: &Document, netlist: impl Into<PathBuf>) {
        self.index.insert(content_hash(document), netlist.into());
    }

    /// Index any `*.net` files in the artifact directory not yet known,
    /// returning how many were added. Unreadable files and netlists
    /// missing their `.raw` sibling are skipped.
    pub fn rescan(&mut self) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let known: HashSet<PathBuf> = self.index.values().cloned().collect();
        let mut added = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "net") || known.contains(&path) {
                continue;
            }
            if !path.with_extension("raw").is_file() {
                continue;
            }
            match Document::from_file(&path) {
                Ok(document) => {
                    self.index.entry(content_hash(&document)).or_insert_with(|| {
                        added += 1;
                        path
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable netlist")
                }
            }
        }
        if added > 0 {
            debug!(added, dir = %self.dir.display(), "reconciled run cache against disk");
        }
        added
    }
}

/// Lowercase hex SHA-256 over the document's canonical newline-joined
/// text.
fn content_hash(document: &Document) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The `n`th most recently modified file in `dir` whose name contains
/// `pattern` (1-based). `None` when fewer than `n` files match.
pub fn recent_file(dir: impl AsRef<Path>, pattern: &str, n: usize) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    if n == 0 {
        return Ok(None);
    }
    let entries = fs::read_dir(dir).map_err(|e| SpiceRigError::read(dir, e))?;
    let mut matches: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !name.contains(pattern) {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) {
            matches.push((modified, path));
        }
    }
    matches.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(matches.into_iter().nth(n - 1).map(|(_, path)| path))
}
