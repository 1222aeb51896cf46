//! Scan configuration and the on-disk settings file.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entry::ScanRequest;
use crate::error::ScanError;

/// Extensions recognized when no others are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".ttf", ".otf"];

/// Configuration for scanning operations.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ScanConfig {
    /// File name suffixes that mark a font file, including the leading dot.
    #[builder(default = "default_extensions()")]
    pub extensions: Vec<String>,

    /// Match extensions exactly (`.TTF` is not `.ttf`).
    #[builder(default = "true")]
    pub case_sensitive: bool,

    /// Follow symbolic links into directories.
    #[builder(default = "false")]
    pub follow_symlinks: bool,

    /// Maximum depth below each root (None = unlimited).
    #[builder(default)]
    pub max_depth: Option<usize>,

    /// Bound of the hand-off channel between walkers and the aggregator.
    #[builder(default = "256")]
    pub channel_capacity: usize,

    /// Emit a progress update every this many fonts.
    #[builder(default = "64")]
    pub progress_interval: u64,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn check_extensions(extensions: &[String]) -> Result<(), String> {
    if extensions.is_empty() {
        return Err("At least one font extension is required".to_string());
    }
    if let Some(bad) = extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
        return Err(format!("Extension must start with '.': {bad:?}"));
    }
    Ok(())
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref extensions) = self.extensions {
            check_extensions(extensions)?;
        }
        if self.channel_capacity == Some(0) {
            return Err("Channel capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Check a config that did not come through the builder.
    pub fn validate(&self) -> Result<(), ScanError> {
        check_extensions(&self.extensions)
            .map_err(|message| ScanError::InvalidConfig { message })?;
        if self.channel_capacity == 0 {
            return Err(ScanError::InvalidConfig {
                message: "Channel capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// If `file_name` carries a recognized extension, return it with that
    /// extension stripped.
    pub fn matches<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.extensions.iter().find_map(|ext| {
            if self.case_sensitive {
                return file_name.strip_suffix(ext.as_str());
            }
            let split = file_name.len().checked_sub(ext.len())?;
            if !file_name.is_char_boundary(split) {
                return None;
            }
            let (stem, suffix) = file_name.split_at(split);
            suffix.eq_ignore_ascii_case(ext).then_some(stem)
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            case_sensitive: true,
            follow_symlinks: false,
            max_depth: None,
            channel_capacity: 256,
            progress_interval: 64,
        }
    }
}

/// Contents of the optional `config.toml`.
///
/// ```toml
/// roots = ["~/fonts", "/usr/share/fonts"]
///
/// [scan]
/// extensions = [".ttf", ".otf", ".ttc"]
/// follow_symlinks = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Roots to scan; the system font directories when absent.
    pub roots: Option<Vec<String>>,
    /// Scanner tuning.
    pub scan: ScanConfig,
}

impl Settings {
    /// Default settings location, `<config dir>/fontseek/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("fontseek").join("config.toml"))
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ScanError> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ScanError::io(path, e)),
        };
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ScanError> {
        let settings: Self = toml::from_str(text).map_err(|e| ScanError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.scan.validate()?;
        Ok(settings)
    }

    /// The scan request these settings describe.
    pub fn request(&self) -> ScanRequest {
        match &self.roots {
            Some(roots) => ScanRequest::new(roots.iter().cloned()),
            None => ScanRequest::system_default(),
        }
    }
}
