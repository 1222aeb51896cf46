//! Core types and configuration for fontseek.
//!
//! This crate provides the data model shared by the scanner and its
//! consumers: discovered font entries, scan requests and results, scan
//! configuration, and the non-fatal warning types collected during a walk.

mod config;
mod entry;
mod error;
mod paths;

pub use config::{ScanConfig, ScanConfigBuilder, Settings, DEFAULT_EXTENSIONS};
pub use entry::{sort_by_name, FontEntry, ScanRequest, ScanResult, ScanState};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use paths::{expand_root, expand_root_with};
