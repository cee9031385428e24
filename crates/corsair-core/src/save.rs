//! Read-only view of a pilot save file.

use std::collections::BTreeMap;
use std::path::Path;

use crate::datanode::DataFile;
use crate::error::{ContentError, Diagnostics};
use crate::escape::unescape;

/// Top-level keys a save file is expected to contain.
pub const SAVE_KEYS: [&str; 8] = [
    "pilot", "date", "system", "planet", "account", "ship", "visited", "cargo",
];

/// What a save file holds, at a glance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveSummary {
    pub pilot: Option<String>,
    pub system: Option<String>,
    pub planet: Option<String>,
    /// Count of each known top-level key.
    pub counts: BTreeMap<String, usize>,
    /// Top-level keys outside [`SAVE_KEYS`].
    pub unknown: usize,
}

impl SaveSummary {
    pub fn from_file(file: &DataFile) -> Self {
        let mut summary = SaveSummary::default();
        for node in file.roots() {
            let key = node.key();
            if !SAVE_KEYS.contains(&key) {
                summary.unknown += 1;
                continue;
            }
            *summary.counts.entry(key.to_string()).or_default() += 1;
            let value = || unescape(&node.tokens()[1..].join(" "));
            match key {
                "pilot" => summary.pilot = Some(value()),
                "system" => summary.system = Some(value()),
                "planet" => summary.planet = Some(value()),
                _ => {}
            }
        }
        summary
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

/// Parse a save from disk; returns the tree and its summary.
pub fn parse_save(
    path: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFile, SaveSummary), ContentError> {
    let file = DataFile::load(path, diagnostics)?;
    let summary = SaveSummary::from_file(&file);
    Ok((file, summary))
}
