//! Home-directory expansion for configured roots.

use std::path::{Path, PathBuf};

/// Expand a leading `~/` to the current user's home directory.
///
/// Paths without the prefix come back unchanged. If the home directory
/// cannot be resolved the path is returned unexpanded.
pub fn expand_root(path: &str) -> PathBuf {
    expand_root_with(path, dirs::home_dir().as_deref())
}

/// Same as [`expand_root`] with an explicit home directory.
pub fn expand_root_with(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(rest) = path.strip_prefix("~/") else {
        return PathBuf::from(path);
    };
    // Joining an absolute remainder would replace the home directory
    let rest = rest.trim_start_matches('/');

    match home {
        Some(home) if rest.is_empty() => home.to_path_buf(),
        Some(home) => home.join(rest),
        None => {
            tracing::debug!(path, "home directory unavailable, leaving root unexpanded");
            PathBuf::from(path)
        }
    }
}
