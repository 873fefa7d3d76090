//! Image discovery and upload.
//!
//! Walks the image root, uploads every image whose key is not cached yet
//! and persists the cache. Keys are derived relative to the image root's
//! *parent*, so for a layout like
//!
//! ```text
//! blog/
//! ├── post.md          # ![diagram](/imgs/diagram.png)
//! └── imgs/
//!     └── diagram.png  # key: /imgs/diagram.png
//! ```
//!
//! the key is exactly the reference written in the document.

use crate::api::Uploader;
use crate::cache::PathCache;
use crate::error::{Result, SyncError};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognised as images, compared lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: usize,
    pub skipped: usize,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Cache key for `path`: its components below `base`, joined with `/` and
/// prefixed with `/`. `None` if `path` is not under `base`.
pub fn cache_key(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut key = String::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                key.push('/');
                key.push_str(&part.to_string_lossy());
            }
            _ => return None,
        }
    }
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
/// Symlinks are kept as written so keys follow the directory names the
/// documents use.
pub fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Upload every uncached image under `image_root`, then save and reload
/// the cache. The first failed upload aborts the run; images uploaded
/// before it stay in memory only.
pub fn sync(image_root: &Path, cache: &mut PathCache, uploader: &impl Uploader) -> Result<SyncReport> {
    if !image_root.is_dir() {
        return Err(SyncError::NotADirectory(image_root.to_path_buf()));
    }
    let root = absolute_path(image_root).map_err(|e| SyncError::io(image_root, e))?;
    let base = root.parent().unwrap_or(&root).to_path_buf();

    let mut report = SyncReport::default();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        // File symlinks count; directory symlinks are not descended into.
        if !entry.path().is_file() || !is_image(entry.path()) {
            continue;
        }
        let Some(key) = cache_key(&base, entry.path()) else {
            continue;
        };
        if cache.contains(&key) {
            tracing::debug!(key = %key, "already uploaded");
            report.skipped += 1;
            continue;
        }

        tracing::info!("Uploading: {}", entry.path().display());
        let url = uploader.upload(entry.path())?;
        cache.insert(key, url);
        report.uploaded += 1;
    }

    cache.save()?;
    cache.reload()?;
    tracing::info!("Image cache updated: {}", cache.path().display());
    Ok(report)
}
