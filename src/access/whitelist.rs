use log::{info, warn};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

/// Column name expected in the whitelist header row
pub const PLATE_COLUMN: &str = "plate_number";

/// Plates allowed through the gate. Fixed for the lifetime of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedSet {
    plates: HashSet<String>,
}

impl AuthorizedSet {
    pub fn from_plates<I, S>(plates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let plates = plates
            .into_iter()
            .map(|p| canonical(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { plates }
    }

    /// Load the whitelist file.
    ///
    /// A missing or unreadable file is not fatal: it yields an empty set
    /// (every plate denied) and a warning.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let set = Self::parse(&contents);
                info!("loaded {} authorized plates from {}", set.len(), path.display());
                set
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("whitelist file {} not found; every plate will be denied", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("cannot read whitelist file {}: {}; every plate will be denied", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse whitelist text: a header row, then one plate per row.
    ///
    /// The plate is taken from the `plate_number` column, or the first cell
    /// when the header has no such column. Entries are trimmed and
    /// uppercased; duplicates collapse.
    ///
    /// Rows are split on every comma. Surrounding quotes are stripped from a
    /// cell, but a quoted cell that itself contains a comma is not supported.
    pub fn parse(contents: &str) -> Self {
        let mut lines = contents.lines();
        let column = lines
            .next()
            .and_then(|header| {
                split_row(header)
                    .iter()
                    .position(|cell| cell.trim().eq_ignore_ascii_case(PLATE_COLUMN))
            })
            .unwrap_or(0);

        let plates = lines
            .filter_map(|line| split_row(line).get(column).map(|cell| canonical(cell)))
            .filter(|p| !p.is_empty())
            .collect();
        Self { plates }
    }

    pub fn is_authorized(&self, plate: &str) -> bool {
        self.plates.contains(plate)
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.plates.iter().map(String::as_str)
    }
}

fn canonical(cell: &str) -> String {
    cell.trim().trim_matches('"').trim().to_uppercase()
}

fn split_row(line: &str) -> Vec<&str> {
    line.trim_end_matches('\r').split(',').collect()
}
