//! Utility functions and helpers

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Short hex digest of the given content
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Express `path` relative to `base` when it lies under it
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    if path.starts_with(base) {
        pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}

/// Clean a path lexically, keeping `..` components that cannot be resolved
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if path.starts_with('/') => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    if path.starts_with('/') {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

/// Render a path with forward slashes, as bundlers expect
pub fn slash_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
