//! Atomic file replacement.
//!
//! Content goes to a temp file created next to the target and is then
//! renamed over it, so readers see either the old file or the new one.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::fs;

/// Write `content` to `path` atomically, creating the parent directory first.
///
/// The temp file is removed automatically when any step fails.
pub async fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory"))?;
    fs::create_dir_all(parent).await?;

    let parent = parent.to_path_buf();
    let target = path.to_path_buf();
    let content = content.to_string();
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}
