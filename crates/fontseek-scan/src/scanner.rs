//! Concurrent multi-root font scanner.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use fontseek_core::{
    FontEntry, ScanConfig, ScanError, ScanRequest, ScanResult, ScanState, ScanWarning,
};

use crate::progress::{ProgressTracker, ScanProgress};
use crate::walker::{walk_root, WalkEvent};

/// Scanner that walks every root of a request in parallel.
///
/// Each root gets its own walk task on the blocking pool. Walkers only send
/// what they find to one aggregator task, which is the sole owner of the
/// result list.
pub struct FontScanner {
    config: Arc<ScanConfig>,
    progress_tx: broadcast::Sender<ScanProgress>,
    state_tx: watch::Sender<ScanState>,
}

/// Everything the aggregator gathered.
#[derive(Debug, Default)]
struct Collected {
    entries: Vec<FontEntry>,
    warnings: Vec<ScanWarning>,
}

impl FontScanner {
    /// Create a scanner with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Create a scanner with a custom configuration.
    pub fn with_config(config: ScanConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        let (state_tx, _) = watch::channel(ScanState::Idle);
        Self {
            config: Arc::new(config),
            progress_tx,
            state_tx,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// State of the most recent scan.
    pub fn state(&self) -> ScanState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions of this scanner.
    pub fn watch_state(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Scan every root of `request` and return the fonts sorted by name.
    ///
    /// Never fails. Unreadable entries end up in [`ScanResult::warnings`];
    /// if `cancel` fires, whatever was aggregated so far is returned with
    /// [`ScanState::Canceled`]. Returns only after every walk task has
    /// exited.
    pub async fn scan(&self, cancel: &CancellationToken, request: &ScanRequest) -> ScanResult {
        let start = Instant::now();
        self.state_tx.send_replace(ScanState::Running);

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let visited = Arc::new(AtomicU64::new(0));
        let aggregator = tokio::spawn(aggregate(
            rx,
            self.progress_tx.clone(),
            self.config.progress_interval,
            ProgressTracker::new(start, Arc::clone(&visited)),
        ));

        let mut walkers = JoinSet::new();
        for root in request.expanded() {
            tracing::debug!(root = %root.display(), "starting walk");
            let tx = tx.clone();
            let cancel = cancel.clone();
            let config = Arc::clone(&self.config);
            let visited = Arc::clone(&visited);
            walkers.spawn_blocking(move || walk_root(root, &config, &cancel, &tx, &visited));
        }
        // Walkers hold the remaining senders; the aggregator stops once they exit
        drop(tx);

        let mut canceled = false;
        while let Some(joined) = walkers.join_next().await {
            match joined {
                Ok(summary) => {
                    tracing::debug!(
                        root = %summary.root.display(),
                        visited = summary.visited,
                        fonts = summary.emitted,
                        canceled = summary.canceled,
                        "walk finished"
                    );
                    canceled |= summary.canceled;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "walk task ended abnormally");
                }
            }
        }

        let collected = aggregator.await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "aggregator task ended abnormally");
            Collected::default()
        });

        let state = if canceled {
            ScanState::Canceled
        } else {
            ScanState::Completed
        };
        let result =
            ScanResult::from_discovered(collected.entries, state, collected.warnings, start.elapsed());

        tracing::info!(
            fonts = result.len(),
            warnings = result.warnings.len(),
            state = %state,
            elapsed_ms = result.duration.as_millis() as u64,
            "font scan finished"
        );
        self.state_tx.send_replace(state);
        result
    }

    /// Run [`scan`](Self::scan) to completion on a private runtime.
    ///
    /// For callers that are not already inside a tokio runtime.
    pub fn scan_blocking(
        &self,
        cancel: &CancellationToken,
        request: &ScanRequest,
    ) -> Result<ScanResult, ScanError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| ScanError::Io {
                path: Default::default(),
                source: e,
            })?;
        Ok(runtime.block_on(self.scan(cancel, request)))
    }
}

impl Default for FontScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain walker events into the result list until every sender is gone.
async fn aggregate(
    mut rx: mpsc::Receiver<WalkEvent>,
    progress_tx: broadcast::Sender<ScanProgress>,
    interval: u64,
    mut tracker: ProgressTracker,
) -> Collected {
    let mut collected = Collected::default();

    while let Some(event) = rx.recv().await {
        match event {
            WalkEvent::Found(entry) => {
                tracker.record_font(&entry.path);
                collected.entries.push(entry);
                if tracker.is_due(interval) {
                    let _ = progress_tx.send(tracker.snapshot());
                }
            }
            WalkEvent::Skipped(warning) => {
                tracker.record_warning();
                collected.warnings.push(warning);
            }
        }
    }

    let _ = progress_tx.send(tracker.snapshot());
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_font_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("sans")).unwrap();
        fs::create_dir(root.join("serif")).unwrap();

        fs::write(root.join("b.ttf"), b"").unwrap();
        fs::write(root.join("a.otf"), b"").unwrap();
        fs::write(root.join("c.txt"), b"").unwrap();
        fs::write(root.join("sans/Inter.ttf"), b"").unwrap();
        fs::write(root.join("serif/Garamond.otf"), b"").unwrap();

        temp
    }

    fn request_for(temp: &TempDir) -> ScanRequest {
        ScanRequest::new([temp.path().to_string_lossy().to_string()])
    }

    #[tokio::test]
    async fn test_basic_scan() {
        let temp = create_font_tree();
        let scanner = FontScanner::new();
        assert_eq!(scanner.state(), ScanState::Idle);

        let result = scanner.scan(&CancellationToken::new(), &request_for(&temp)).await;

        assert_eq!(result.names(), vec!["Garamond", "Inter", "a", "b"]);
        assert_eq!(result.state, ScanState::Completed);
        assert_eq!(scanner.state(), ScanState::Completed);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_broadcast() {
        let temp = create_font_tree();
        let scanner = FontScanner::with_config(ScanConfig {
            progress_interval: 1,
            ..ScanConfig::default()
        });
        let mut progress_rx = scanner.subscribe();

        scanner.scan(&CancellationToken::new(), &request_for(&temp)).await;

        let mut last = ScanProgress::new();
        while let Ok(progress) = progress_rx.try_recv() {
            last = progress;
        }
        assert_eq!(last.fonts_found, 4);
        // root, sans, serif, three top-level files, two nested fonts
        assert_eq!(last.entries_visited, 8);
        assert_eq!(last.warnings_count, 0);
    }

    #[test]
    fn test_scan_blocking() {
        let temp = create_font_tree();
        let scanner = FontScanner::new();

        let result = scanner
            .scan_blocking(&CancellationToken::new(), &request_for(&temp))
            .unwrap();

        assert_eq!(result.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_request_completes() {
        let scanner = FontScanner::new();
        let result = scanner
            .scan(&CancellationToken::new(), &ScanRequest::default())
            .await;

        assert!(result.is_empty());
        assert_eq!(result.state, ScanState::Completed);
    }
}
