//! Font file scanning engine for fontseek.
//!
//! # Overview
//!
//! `fontseek-scan` walks a set of root directories and collects every file
//! whose name ends in a recognized font extension. Key features:
//!
//! - **One walk task per root**, all running concurrently
//! - **Single aggregator** owning the result list, fed over a bounded channel
//! - **Cooperative cancellation** through a shared [`CancellationToken`]
//! - **Progress updates** via broadcast channels
//!
//! Per-entry errors never fail a scan. They are collected as warnings and
//! the walk carries on.
//!
//! # Example
//!
//! ```rust,no_run
//! use fontseek_scan::{FontScanner, ScanRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() {
//! let scanner = FontScanner::new();
//! let cancel = CancellationToken::new();
//! let result = scanner.scan(&cancel, &ScanRequest::system_default()).await;
//!
//! for font in &result {
//!     println!("{}\t{}", font.name, font.path.display());
//! }
//! # }
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use fontseek_scan::FontScanner;
//!
//! let scanner = FontScanner::new();
//! let mut progress_rx = scanner.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Found {} fonts", progress.fonts_found);
//!     }
//! });
//! ```

mod progress;
mod scanner;
mod walker;

pub use progress::ScanProgress;
pub use scanner::FontScanner;
pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use fontseek_core::{
    expand_root, FontEntry, ScanConfig, ScanError, ScanRequest, ScanResult, ScanState,
    ScanWarning, WarningKind,
};
