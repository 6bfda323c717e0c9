use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_FILE_NAME: &str = "GenUI-Code.html";

/// Writes `code` to [`EXPORT_FILE_NAME`] inside `dir`, replacing any previous export.
pub fn export_code(dir: &Path, code: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow!("cannot create {}: {}", dir.display(), e))?;

    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, code.as_bytes())
        .map_err(|e| anyhow!("cannot write {}: {}", path.display(), e))?;

    tracing::info!(path = %path.display(), bytes = code.len(), "exported code");
    Ok(path)
}
