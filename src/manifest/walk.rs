//! Async directory listing helpers

use std::path::{Path, PathBuf};

use tokio::fs;

pub(crate) async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|meta| meta.is_dir())
}

/// Immediate subdirectories of `dir`, sorted by path
pub(crate) async fn list_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut dirs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_dir(&path).await {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Top-level `*.json` files of `dir`
pub(crate) async fn list_json_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }

    Ok(files)
}
