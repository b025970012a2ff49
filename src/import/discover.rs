// Source tree discovery for import

use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use walkdir::WalkDir;

use crate::classify::FileKind;
use crate::error::{PhotoVaultError, Result};
use crate::metadata::MetadataGateway;

/// One file found under the import root. Immutable once discovered.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Case-normalized extension (lowercased); the original case is still on `path`.
    pub extension: String,
    pub kind: FileKind,
    /// Capture time from metadata, or the filesystem mtime when unreadable.
    pub captured: NaiveDateTime,
    pub captured_from_metadata: bool,
}

/// Walk the source root and return every regular file, sorted by path.
/// Handles both DCIM-style card layouts and flat directories.
pub fn scan_source_tree(source_root: &Path) -> Result<Vec<PathBuf>> {
    if !source_root.exists() {
        return Err(PhotoVaultError::Source(format!(
            "Source directory does not exist: {}",
            source_root.display()
        )));
    }
    if !source_root.is_dir() {
        return Err(PhotoVaultError::Source(format!(
            "Source is not a directory: {}",
            source_root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(source_root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        // Dotfiles (card config, ledgers, OS droppings) are not media
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(true)
        {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Build a `SourceFile` for one discovered path, resolving its capture time
/// through the gateway with a filesystem-mtime fallback. An unreadable
/// capture date only degrades the timestamp source; the error case is a file
/// that cannot even be stat'ed (vanished mid-scan), which callers treat as a
/// per-file failure.
pub fn resolve_source_file(
    path: &Path,
    kind: FileKind,
    gateway: &dyn MetadataGateway,
) -> Result<SourceFile> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let (captured, from_metadata) = match gateway.read_capture_date(path) {
        Some(dt) => (dt, true),
        None => (filesystem_mtime(path)?, false),
    };

    Ok(SourceFile {
        path: path.to_path_buf(),
        extension,
        kind,
        captured,
        captured_from_metadata: from_metadata,
    })
}

fn filesystem_mtime(path: &Path) -> Result<NaiveDateTime> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| {
            PhotoVaultError::Import(format!("Cannot stat {}: {}", path.display(), e))
        })?;
    let datetime: chrono::DateTime<chrono::Local> = modified.into();
    Ok(datetime.naive_local())
}
