//! Rewrites local image references in markdown documents to hosted URLs.
//!
//! Two link forms are recognised: markdown images `![alt](target)` and
//! inline HTML `<img src="target">` (single or double quotes). Targets
//! starting with `http` are already remote and left alone; every other
//! target must be present in the cache.

use crate::cache::PathCache;
use crate::error::{Result, SyncError};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static IMAGE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[.*?\]\((.*?)\)|<img.*?src *= *['"](.*?)['"].*?>"#).expect("valid image pattern")
});

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    pub scanned: usize,
    pub updated: usize,
}

/// Every `*.md` file under `doc_root`, in walk order. The suffix match is
/// case-sensitive, so `README.MD` is not a document.
pub fn list_documents(doc_root: &Path) -> Result<Vec<PathBuf>> {
    if !doc_root.is_dir() {
        return Err(SyncError::NotADirectory(doc_root.to_path_buf()));
    }
    let mut docs = Vec::new();
    for entry in WalkDir::new(doc_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.path().is_file() && entry.file_name().to_string_lossy().ends_with(".md") {
            docs.push(entry.into_path());
        }
    }
    Ok(docs)
}

/// Local image targets referenced on `line`, empty captures dropped.
pub fn image_references(line: &str) -> Vec<&str> {
    IMAGE_REF
        .captures_iter(line)
        .flat_map(|caps| [caps.get(1), caps.get(2)])
        .flatten()
        .map(|m| m.as_str())
        .filter(|target| !target.is_empty())
        .collect()
}

/// Substitute every cached reference on `line`. Returns the new line and
/// whether any reference was resolved through the cache.
pub fn rewrite_line(line: &str, cache: &PathCache, document: &Path) -> Result<(String, bool)> {
    let mut out = line.to_string();
    let mut replaced = false;
    for target in image_references(line) {
        if target.starts_with("http") {
            continue;
        }
        let url = cache.get(target).ok_or_else(|| SyncError::MissingEntry {
            reference: target.to_string(),
            document: document.to_path_buf(),
        })?;
        out = out.replace(target, url);
        replaced = true;
    }
    Ok((out, replaced))
}

/// Rewrite one document in place. Nothing is written unless every line
/// resolved, so a missing cache entry leaves the file untouched.
pub fn rewrite(file: &Path, cache: &PathCache) -> Result<bool> {
    let content = fs::read_to_string(file).map_err(|e| SyncError::io(file, e))?;

    let mut new_content = String::with_capacity(content.len());
    let mut replaced = false;
    for line in content.split_inclusive('\n') {
        let (line, hit) = rewrite_line(line, cache, file)?;
        replaced |= hit;
        new_content.push_str(&line);
    }

    fs::write(file, new_content).map_err(|e| SyncError::io(file, e))?;
    if replaced {
        tracing::info!("Updated: {}", file.display());
    }
    Ok(replaced)
}

/// Rewrite every document under `doc_root`, stopping at the first failure.
pub fn rewrite_all(doc_root: &Path, cache: &PathCache) -> Result<RewriteReport> {
    let mut report = RewriteReport::default();
    for doc in list_documents(doc_root)? {
        if rewrite(&doc, cache)? {
            report.updated += 1;
        }
        report.scanned += 1;
    }
    Ok(report)
}
