//! Filterable font list with a selection cursor.

use std::path::PathBuf;

use nucleo::{Config, Matcher, Utf32Str};

use fontseek_core::{FontEntry, ScanResult};

use crate::preview::FontPreview;

/// One visible row of a filtered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMatch {
    /// Position of the entry in the unfiltered list.
    pub index: usize,
    /// Match score (higher is better).
    pub score: u32,
    /// Indices of matched characters for highlighting.
    pub matched_indices: Vec<usize>,
}

/// Scanned fonts plus the state of a list view over them.
pub struct FontList {
    entries: Vec<FontEntry>,
    query: String,
    matches: Vec<FontMatch>,
    selected: usize,
    matcher: Matcher,
}

impl FontList {
    /// Create a list showing every entry in the given order.
    pub fn new(entries: Vec<FontEntry>) -> Self {
        let mut list = Self {
            entries,
            query: String::new(),
            matches: Vec::new(),
            selected: 0,
            matcher: Matcher::new(Config::DEFAULT),
        };
        list.refresh();
        list
    }

    /// All entries, unfiltered.
    pub fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    /// Current filter text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Set the filter text and recompute the visible rows.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refresh();
    }

    /// Drop the filter and show everything again.
    pub fn clear_query(&mut self) {
        self.set_query(String::new());
    }

    /// Visible rows, best match first.
    pub fn matches(&self) -> &[FontMatch] {
        &self.matches
    }

    /// Visible entries in display order.
    pub fn visible(&self) -> impl Iterator<Item = &FontEntry> {
        self.matches.iter().map(|m| &self.entries[m.index])
    }

    /// Number of visible rows.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Row index of the cursor.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Entry under the cursor, if any row is visible.
    pub fn selected(&self) -> Option<&FontEntry> {
        self.matches.get(self.selected).map(|m| &self.entries[m.index])
    }

    /// Move the cursor down, stopping at the last row.
    pub fn select_next(&mut self) {
        if self.selected + 1 < self.matches.len() {
            self.selected += 1;
        }
    }

    /// Move the cursor up, stopping at the first row.
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Put the cursor on `row`, clamped to the visible rows.
    pub fn select(&mut self, row: usize) {
        self.selected = row.min(self.matches.len().saturating_sub(1));
    }

    /// Hand the selected entry's path to `preview`.
    ///
    /// Returns the path that was handed over.
    pub fn choose(&self, preview: &mut dyn FontPreview) -> Option<PathBuf> {
        let entry = self.selected()?;
        tracing::debug!(font = %entry.name, "previewing selection");
        preview.preview(&entry.path);
        Some(entry.path.clone())
    }

    fn refresh(&mut self) {
        self.matches.clear();
        self.selected = 0;

        if self.query.is_empty() {
            self.matches.extend((0..self.entries.len()).map(|index| FontMatch {
                index,
                score: 0,
                matched_indices: Vec::new(),
            }));
            return;
        }

        // The matcher folds the haystack's case, so the needle must be folded too
        let needle_text = self.query.to_lowercase();
        let mut needle_buf = Vec::new();
        let needle = Utf32Str::new(&needle_text, &mut needle_buf);

        let mut haystack_buf = Vec::new();
        let mut indices = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            haystack_buf.clear();
            indices.clear();
            let haystack = Utf32Str::new(entry.filter_value(), &mut haystack_buf);
            if let Some(score) = self.matcher.fuzzy_indices(haystack, needle, &mut indices) {
                let mut matched_indices: Vec<usize> = indices.iter().map(|&i| i as usize).collect();
                matched_indices.sort_unstable();
                matched_indices.dedup();
                self.matches.push(FontMatch {
                    index,
                    score: score as u32,
                    matched_indices,
                });
            }
        }

        // Stable, so equal scores keep list order
        self.matches.sort_by(|a, b| b.score.cmp(&a.score));
    }
}

impl From<ScanResult> for FontList {
    fn from(result: ScanResult) -> Self {
        Self::new(result.into_entries())
    }
}
