//! Persisted mapping from local image path to hosted URL.
//!
//! Keys look like `/imgs/diagram.png`: the path relative to the image
//! root's parent, forward slashes, leading `/`. The file is a plain JSON
//! object so it can be edited by hand between runs.

use crate::error::{Result, SyncError};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PathCache {
    /// Read the cache file. A missing or zero-length file yields an empty
    /// cache; a zero-length file is what an interrupted write leaves behind.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        Ok(PathCache { path, entries })
    }

    /// Overwrite the backing file with the current entries.
    pub fn save(&self) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.entries
            .serialize(&mut ser)
            .map_err(|e| SyncError::io(&self.path, std::io::Error::other(e)))?;
        fs::write(&self.path, buf).map_err(|e| SyncError::io(&self.path, e))
    }

    /// Replace the in-memory entries with what is on disk.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = read_entries(&self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(key.into(), url.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(SyncError::io(path, e)),
    };
    if content.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&content).map_err(|source| SyncError::CacheParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = PathCache::load(tmp.path().join("config.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_length_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "").unwrap();
        let cache = PathCache::load(&path).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = PathCache::load(&path).unwrap_err();
        assert!(matches!(err, SyncError::CacheParse { .. }));
    }

    #[test]
    fn non_string_values_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"/imgs/a.png": 3}"#).unwrap();
        assert!(PathCache::load(&path).is_err());
    }

    #[test]
    fn save_then_load_preserves_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut cache = PathCache::load(&path).unwrap();
        cache.insert("/imgs/a.png", "https://host/a.png");
        cache.insert("/imgs/图片.png", "https://host/b.png");
        cache.save().unwrap();

        let loaded = PathCache::load(&path).unwrap();
        assert_eq!(loaded.entries, cache.entries);
    }

    #[test]
    fn saved_file_is_pretty_and_keeps_unicode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut cache = PathCache::load(&path).unwrap();
        cache.insert("/imgs/图片.png", "https://host/b.png");
        cache.save().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n    \"/imgs/图片.png\": \"https://host/b.png\"\n}");
    }

    #[test]
    fn save_overwrites_longer_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, format!("{{\"/a.png\": \"{}\"}}", "x".repeat(500))).unwrap();
        let mut cache = PathCache::load(&path).unwrap();
        cache.insert("/a.png", "short");
        cache.save().unwrap();

        cache.reload().unwrap();
        assert_eq!(cache.get("/a.png"), Some("short"));
        assert_eq!(cache.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn save_failure_is_reported_as_io() {
        let tmp = TempDir::new().unwrap();
        // A directory where the file should be makes the write fail.
        let path = tmp.path().join("config.json");
        let mut cache = PathCache::load(&path).unwrap();
        fs::create_dir(&path).unwrap();
        cache.insert("/a.png", "https://host/a.png");

        let err = cache.save().unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        let mut cache = PathCache::load(&path).unwrap();
        fs::write(&path, r#"{"/imgs/x.png": "https://host/x.png"}"#).unwrap();
        cache.reload().unwrap();
        assert!(cache.contains("/imgs/x.png"));
    }
}
