//! Filesystem helpers shared by the download and build stages.

use std::path::Path;

use uuid::Uuid;

use crate::error::{DocsetError, Result};

/// Write `contents` to `path` so that readers never see a partial file.
///
/// The data goes to a uniquely named temp file in the target directory, which
/// is then renamed over `path`. Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    write_atomic_with(path, |temp| {
        std::fs::write(temp, contents).map_err(|e| DocsetError::io(temp, e))
    })
}

/// Like [`write_atomic`], for output produced by `write` streaming into the
/// temp file at the path it is given.
pub fn write_atomic_with(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| DocsetError::validation(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| DocsetError::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.{}.tmp", Uuid::now_v7()));

    if let Err(e) = write(&temp) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(DocsetError::io(path, e));
    }
    Ok(())
}
