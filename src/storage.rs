//! Temp-file plus atomic-rename publishing.
//!
//! The catalog file and every downloaded document are shared between
//! concurrent readers and writers. Writers always fill a uniquely named
//! sibling temp file and `rename` it over the final name, so a reader sees
//! either the previous complete file or the new complete file.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Returns a unique hidden sibling path used while `final_path` is being written.
///
/// The temp file lives in the same directory as the final file so the
/// publishing rename never crosses a filesystem boundary.
#[must_use]
pub fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map_or_else(|| "download".to_string(), |n| n.to_string_lossy().into_owned());
    let suffix: u32 = rand::random();
    final_path.with_file_name(format!(".{name}.{suffix:08x}.part"))
}

/// Moves a fully written temp file over `final_path`.
///
/// The temp file is removed when the rename fails.
///
/// # Errors
///
/// Returns the rename error.
pub async fn publish(temp_path: &Path, final_path: &Path) -> io::Result<()> {
    match tokio::fs::rename(temp_path, final_path).await {
        Ok(()) => {
            debug!(path = %final_path.display(), "published file");
            Ok(())
        }
        Err(error) => {
            let _ = tokio::fs::remove_file(temp_path).await;
            Err(error)
        }
    }
}

/// Writes `bytes` to `path` atomically, creating parent directories.
///
/// # Errors
///
/// Returns any IO error from directory creation, the temp write or the rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    if let Err(error) = tokio::fs::write(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error);
    }
    publish(&temp_path, path).await
}
