//! Install discovery and output placement
//!
//! Finds versioned install directories of the managed application by
//! probing a per-OS table of candidate roots, then writes the merged
//! document into each of them.

use crate::error::AppError;
use crate::fsutil;
use crate::settings::{InstallConfig, OutputConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Built-in candidate install roots for this platform. `%s` expands to
/// the user's home directory.
pub fn default_roots() -> Vec<String> {
    #[cfg(target_os = "windows")]
    let roots = [
        "%s/AppData/Local/Player/Versions",
        "%s/AppData/Roaming/Player/Versions",
    ];

    #[cfg(target_os = "macos")]
    let roots = [
        "/Applications/Player.app/Contents/MacOS/Versions",
        "%s/Applications/Player.app/Contents/MacOS/Versions",
    ];

    #[cfg(all(unix, not(target_os = "macos")))]
    let roots = [
        "%s/.local/share/player/versions",
        "%s/.var/app/org.player.Player/data/player/versions",
    ];

    roots.iter().map(|s| s.to_string()).collect()
}

/// Expand a candidate root template, substituting `%s` with the home
/// directory.
pub fn expand_root(template: &str, home: &Path) -> PathBuf {
    PathBuf::from(template.replace("%s", &home.to_string_lossy()))
}

/// Discover versioned install directories.
///
/// Probes each configured root, keeping directories whose name starts
/// with the version prefix and, when a marker file is configured,
/// containing that marker. Roots that do not exist are skipped silently,
/// unreadable entries with a warning. The result is sorted and deduped.
pub fn discover(config: &InstallConfig) -> Vec<PathBuf> {
    let home = directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut found = Vec::new();
    for template in &config.roots {
        let root = expand_root(template, &home);
        if !root.is_dir() {
            continue;
        }

        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "skipping unreadable install entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if !entry
                .file_name()
                .to_string_lossy()
                .starts_with(&config.version_prefix)
            {
                continue;
            }
            if let Some(marker) = &config.marker {
                if !entry.path().join(marker).exists() {
                    debug!(dir = %entry.path().display(), "no marker file, skipping");
                    continue;
                }
            }

            let path = dunce::canonicalize(entry.path())
                .unwrap_or_else(|_| entry.path().to_path_buf());
            found.push(path);
        }
    }

    found.sort();
    found.dedup();
    debug!(count = found.len(), "install directories discovered");
    found
}

/// Write the merged document into every target install directory at the
/// configured relative path. Returns the paths written.
pub fn write_outputs(
    document: &Value,
    targets: &[PathBuf],
    output: &OutputConfig,
) -> Result<Vec<PathBuf>, AppError> {
    let mut rendered = serde_json::to_string_pretty(document)?;
    rendered.push('\n');

    let mut written = Vec::new();
    for target in targets {
        let path = target.join(&output.settings_path);
        fsutil::write_atomic(&path, rendered.as_bytes())?;
        debug!(path = %path.display(), "merged settings written");
        written.push(path);
    }
    Ok(written)
}
