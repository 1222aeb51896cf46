//! Font entries, scan requests and scan results.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::ScanWarning;
use crate::paths::expand_root;

/// A single discovered font file.
///
/// Two entries are equal when they point at the same path; the name is
/// derived from the path and carries no identity of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// File base name with the font extension stripped.
    pub name: CompactString,
    /// Path of the font file, joined from the (expanded) root.
    pub path: PathBuf,
}

impl FontEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<CompactString>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Label shown in a list view.
    pub fn title(&self) -> &str {
        &self.name
    }

    /// Secondary line shown under the label.
    pub fn description(&self) -> String {
        self.path.display().to_string()
    }

    /// Text that list filtering matches against.
    pub fn filter_value(&self) -> &str {
        &self.name
    }

    /// Path handed to a preview renderer when this entry is chosen.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for FontEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FontEntry {}

impl Hash for FontEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Sort entries by name, byte-wise and case-sensitive.
///
/// The sort is stable, so entries sharing a name keep their discovery order.
pub fn sort_by_name(entries: &mut [FontEntry]) {
    entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
}

/// The set of root directories a scan should walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    roots: Vec<String>,
}

impl ScanRequest {
    /// Create a request from root directory strings.
    ///
    /// Roots may start with `~/`; they are expanded when the scan starts.
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The usual per-user and system font directories on Linux and macOS.
    pub fn system_default() -> Self {
        Self::new([
            "~/.local/share/fonts",
            "/usr/local/share/fonts",
            "/usr/share/fonts",
            "/Library/Fonts",
            "~/Library/Fonts",
        ])
    }

    /// Root strings as configured.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Root paths with home-directory shorthand resolved.
    pub fn expanded(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|r| expand_root(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ScanRequest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Lifecycle of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ScanState {
    /// No scan has started yet.
    #[default]
    Idle,
    /// Walk tasks are in flight.
    Running,
    /// Every root finished on its own.
    Completed,
    /// The cancellation signal fired before every root finished.
    Canceled,
}

impl ScanState {
    /// Whether the scan has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

/// Outcome of one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Discovered fonts, sorted by name.
    pub entries: Vec<FontEntry>,
    /// Terminal state the scan ended in.
    pub state: ScanState,
    /// Per-entry errors that were skipped during the walk.
    pub warnings: Vec<ScanWarning>,
    /// Wall-clock time the scan took.
    pub duration: Duration,
}

impl ScanResult {
    /// Build a result from entries in discovery order, sorting them by name.
    pub fn from_discovered(
        mut entries: Vec<FontEntry>,
        state: ScanState,
        warnings: Vec<ScanWarning>,
        duration: Duration,
    ) -> Self {
        sort_by_name(&mut entries);
        Self {
            entries,
            state,
            warnings,
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FontEntry> {
        self.entries.iter()
    }

    /// Whether the scan was cut short and the entries may be partial.
    pub fn is_canceled(&self) -> bool {
        self.state == ScanState::Canceled
    }

    /// Names in result order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Consume the result, keeping only the entries.
    pub fn into_entries(self) -> Vec<FontEntry> {
        self.entries
    }
}

impl IntoIterator for ScanResult {
    type Item = FontEntry;
    type IntoIter = std::vec::IntoIter<FontEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = &'a FontEntry;
    type IntoIter = std::slice::Iter<'a, FontEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
