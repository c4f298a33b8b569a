//! Small filesystem helpers shared across the pipeline

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `bytes` to `path` atomically: stage a uniquely named temp file
/// in the destination directory, then rename over the destination.
///
/// Missing parent directories are created. Each call stages under its
/// own temp name, so concurrent writers of one destination never touch
/// each other's staging file and the last rename wins. A failed rename
/// drops the temp file before the error is returned.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
