//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of font files found so far.
    pub fonts_found: u64,
    /// Number of filesystem entries looked at so far, across all roots.
    pub entries_visited: u64,
    /// Number of skipped entries so far.
    pub warnings_count: u64,
    /// Path of the most recently found font.
    pub current_path: PathBuf,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            fonts_found: 0,
            entries_visited: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate discovery rate in fonts per second.
    pub fn fonts_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.fonts_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters kept by the aggregator.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    fonts_found: u64,
    /// Bumped by the walkers directly.
    entries_visited: Arc<AtomicU64>,
    warnings_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new(start_time: Instant, entries_visited: Arc<AtomicU64>) -> Self {
        Self {
            start_time,
            fonts_found: 0,
            entries_visited,
            warnings_count: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_font(&mut self, path: &Path) {
        self.fonts_found += 1;
        self.current_path = path.to_path_buf();
    }

    pub fn record_warning(&mut self) {
        self.warnings_count += 1;
    }

    /// Whether a periodic update is due after the latest font.
    pub fn is_due(&self, interval: u64) -> bool {
        interval > 0 && self.fonts_found % interval == 0
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            fonts_found: self.fonts_found,
            entries_visited: self.entries_visited.load(Ordering::Relaxed),
            warnings_count: self.warnings_count,
            current_path: self.current_path.clone(),
            elapsed: self.start_time.elapsed(),
        }
    }
}
