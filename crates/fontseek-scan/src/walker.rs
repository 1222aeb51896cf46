//! Per-root directory walk.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fontseek_core::{FontEntry, ScanConfig, ScanWarning, WarningKind};

/// Message sent from a walk task to the aggregator.
#[derive(Debug)]
pub(crate) enum WalkEvent {
    /// A font file was found.
    Found(FontEntry),
    /// An entry could not be read and was skipped.
    Skipped(ScanWarning),
}

/// What a single root walk did, returned when its task exits.
#[derive(Debug)]
pub(crate) struct WalkSummary {
    pub root: PathBuf,
    pub visited: u64,
    pub emitted: u64,
    pub canceled: bool,
}

impl WalkSummary {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            visited: 0,
            emitted: 0,
            canceled: false,
        }
    }
}

/// Walk one root depth-first, sending every font file to `tx`.
///
/// Blocks the calling thread; run it on the blocking pool. Returns early
/// when `cancel` fires or when the aggregator has gone away. Every entry
/// looked at is added to `visited`, which is shared by all walkers of a scan.
pub(crate) fn walk_root(
    root: PathBuf,
    config: &ScanConfig,
    cancel: &CancellationToken,
    tx: &mpsc::Sender<WalkEvent>,
    visited: &AtomicU64,
) -> WalkSummary {
    let mut summary = WalkSummary::new(&root);

    if cancel.is_cancelled() {
        summary.canceled = true;
        return summary;
    }

    let metadata = match std::fs::metadata(&root) {
        Ok(m) => m,
        Err(err) => {
            send(tx, WalkEvent::Skipped(ScanWarning::from_io(&root, err)));
            return summary;
        }
    };

    // A root may name a single file
    if !metadata.is_dir() {
        summary.visited = 1;
        visited.fetch_add(1, Ordering::Relaxed);
        if metadata.is_file() {
            if let Some(entry) = font_entry(config, &root) {
                if send(tx, WalkEvent::Found(entry)) {
                    summary.emitted = 1;
                }
            }
        }
        return summary;
    }

    let walker = WalkDir::new(&root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(config.follow_symlinks)
        .max_depth(config.max_depth.unwrap_or(usize::MAX));

    for entry_result in walker {
        if cancel.is_cancelled() {
            summary.canceled = true;
            break;
        }
        summary.visited += 1;
        visited.fetch_add(1, Ordering::Relaxed);

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                let warning = walk_warning(&err);
                tracing::trace!(path = %warning.path.display(), error = %err, "skipping unreadable entry");
                if !send(tx, WalkEvent::Skipped(warning)) {
                    break;
                }
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            // jwalk keeps a failed directory listing on the entry itself
            if let Some(err) = &entry.read_children_error {
                let warning = walk_warning(err);
                tracing::trace!(path = %warning.path.display(), error = %err, "skipping unreadable directory");
                if !send(tx, WalkEvent::Skipped(warning)) {
                    break;
                }
            }
            continue;
        }

        let path = entry.path();
        if file_type.is_symlink() {
            // Not followed, so resolve it here to decide whether it is a file
            match std::fs::metadata(&path) {
                Ok(target) if target.is_file() => {}
                Ok(_) => continue,
                Err(_) => {
                    if config.matches(&entry.file_name().to_string_lossy()).is_some()
                        && !send(tx, WalkEvent::Skipped(ScanWarning::broken_symlink(&path)))
                    {
                        break;
                    }
                    continue;
                }
            }
        } else if !file_type.is_file() {
            continue;
        }

        let Some(font) = font_entry(config, &path) else {
            continue;
        };
        if !send(tx, WalkEvent::Found(font)) {
            break;
        }
        summary.emitted += 1;
    }

    summary
}

/// Build an entry for `path` if its file name carries a font extension.
fn font_entry(config: &ScanConfig, path: &Path) -> Option<FontEntry> {
    let file_name = path.file_name()?.to_string_lossy();
    let name = config.matches(&file_name)?;
    Some(FontEntry::new(name, path))
}

/// Hand an event to the aggregator. Returns false once it has hung up.
fn send(tx: &mpsc::Sender<WalkEvent>, event: WalkEvent) -> bool {
    tx.blocking_send(event).is_ok()
}

fn walk_warning(err: &jwalk::Error) -> ScanWarning {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let kind = match err.io_error().map(io::Error::kind) {
        Some(io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
        Some(io::ErrorKind::NotFound) => WarningKind::NotFound,
        _ => WarningKind::ReadError,
    };
    ScanWarning::new(path, err.to_string(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn drain(mut rx: mpsc::Receiver<WalkEvent>) -> (Vec<FontEntry>, Vec<ScanWarning>) {
        let mut fonts = Vec::new();
        let mut warnings = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                WalkEvent::Found(f) => fonts.push(f),
                WalkEvent::Skipped(w) => warnings.push(w),
            }
        }
        (fonts, warnings)
    }

    #[test]
    fn test_walk_finds_nested_fonts() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/b/Deep.otf"), b"").unwrap();
        fs::write(temp.path().join("Top.ttf"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();

        let (tx, rx) = mpsc::channel(16);
        let summary = walk_root(
            temp.path().to_path_buf(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, warnings) = drain(rx);
        let mut names: Vec<_> = fonts.iter().map(|f| f.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["Deep", "Top"]);
        assert!(warnings.is_empty());
        assert_eq!(summary.emitted, 2);
        assert!(!summary.canceled);
    }

    #[test]
    fn test_walk_counts_visited_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a")).unwrap();
        fs::write(temp.path().join("a/One.ttf"), b"").unwrap();
        fs::write(temp.path().join("readme.txt"), b"").unwrap();

        // Shared across walkers, so it accumulates
        let visited = AtomicU64::new(10);
        let (tx, rx) = mpsc::channel(16);
        let summary = walk_root(
            temp.path().to_path_buf(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &visited,
        );
        drop(tx);
        drain(rx);

        // root, a, a/One.ttf, readme.txt
        assert_eq!(summary.visited, 4);
        assert_eq!(visited.load(Ordering::Relaxed), 14);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_a_warning() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("Inside.ttf"), b"").unwrap();
        fs::write(temp.path().join("Outside.ttf"), b"").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            // Permission bits do not apply to this user (root)
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let (tx, rx) = mpsc::channel(16);
        walk_root(
            temp.path().to_path_buf(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let (fonts, warnings) = drain(rx);
        assert_eq!(fonts, vec![FontEntry::new("Outside", temp.path().join("Outside.ttf"))]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::PermissionDenied);
        assert_eq!(warnings[0].path, locked);
    }

    #[test]
    fn test_walk_respects_max_depth() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/Shallow.ttf"), b"").unwrap();
        fs::write(temp.path().join("a/b/Deep.ttf"), b"").unwrap();

        let config = ScanConfig {
            max_depth: Some(2),
            ..ScanConfig::default()
        };
        let (tx, rx) = mpsc::channel(16);
        walk_root(
            temp.path().to_path_buf(),
            &config,
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, _) = drain(rx);
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].name, "Shallow");
    }

    #[test]
    fn test_walk_visits_hidden_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".fonts")).unwrap();
        fs::write(temp.path().join(".fonts/Hidden.ttf"), b"").unwrap();

        let (tx, rx) = mpsc::channel(16);
        walk_root(
            temp.path().to_path_buf(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, _) = drain(rx);
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts[0].name, "Hidden");
    }

    #[test]
    fn test_missing_root_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let (tx, rx) = mpsc::channel(16);
        let summary = walk_root(
            missing.clone(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, warnings) = drain(rx);
        assert!(fonts.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::NotFound);
        assert_eq!(warnings[0].path, missing);
        assert_eq!(summary.visited, 0);
    }

    #[test]
    fn test_file_root_yields_itself() {
        let temp = TempDir::new().unwrap();
        let font = temp.path().join("Solo.ttf");
        fs::write(&font, b"").unwrap();

        let (tx, rx) = mpsc::channel(16);
        walk_root(
            font.clone(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, _) = drain(rx);
        assert_eq!(fonts, vec![FontEntry::new("Solo", font)]);
    }

    #[test]
    fn test_canceled_walk_emits_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.ttf"), b"").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, rx) = mpsc::channel(16);
        let summary = walk_root(
            temp.path().to_path_buf(),
            &ScanConfig::default(),
            &cancel,
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, _) = drain(rx);
        assert!(fonts.is_empty());
        assert!(summary.canceled);
    }

    #[test]
    fn test_cancel_mid_walk_stops_at_next_entry() {
        let temp = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(temp.path().join(format!("f{i:02}.ttf")), b"").unwrap();
        }

        let cancel = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(1);
        let walker = {
            let root = temp.path().to_path_buf();
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                walk_root(root, &ScanConfig::default(), &cancel, &tx, &AtomicU64::new(0))
            })
        };

        // One slot: the walker is at most two sends ahead of us here
        assert!(matches!(rx.blocking_recv(), Some(WalkEvent::Found(_))));
        cancel.cancel();
        let mut received = 1;
        while rx.blocking_recv().is_some() {
            received += 1;
        }

        let summary = walker.join().unwrap();
        assert!(summary.canceled);
        assert!(received <= 3);
        assert_eq!(summary.emitted, received);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("Real.ttf"), b"").unwrap();

        let root = temp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        symlink(real.join("Real.ttf"), root.join("Alias.ttf")).unwrap();
        symlink(temp.path().join("gone.ttf"), root.join("Dangling.ttf")).unwrap();
        symlink(&real, root.join("linked_dir")).unwrap();

        let (tx, rx) = mpsc::channel(16);
        walk_root(
            root.clone(),
            &ScanConfig::default(),
            &CancellationToken::new(),
            &tx,
            &AtomicU64::new(0),
        );
        drop(tx);

        let (fonts, warnings) = drain(rx);
        // Directory links are not followed by default
        assert_eq!(fonts, vec![FontEntry::new("Alias", root.join("Alias.ttf"))]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::BrokenSymlink);

        let config = ScanConfig {
            follow_symlinks: true,
            ..ScanConfig::default()
        };
        let (tx, rx) = mpsc::channel(16);
        walk_root(root.clone(), &config, &CancellationToken::new(), &tx, &AtomicU64::new(0));
        drop(tx);

        let (fonts, _) = drain(rx);
        assert!(fonts.iter().any(|f| f.path == root.join("linked_dir/Real.ttf")));
    }
}
