//! Slug-keyed artifact stores.
//!
//! The filesystem is the pipeline's only durable state: a directory of
//! per-episode files whose stems are slugs. [`ArtifactStore`] abstracts
//! that capability set (`exists`, `list_slugs`, `write`, `path_for`) so
//! the orchestrator can run against the real filesystem in production and
//! an in-memory map in tests without changing any logic.
//!
//! Two store instances back one run: the raw store (`raw/*.txt`), written
//! only by the orchestrator, and the summary store (`summaries/*.md`),
//! owned by the external summarizer and consulted read-only here.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Capability set for a slug-keyed artifact store.
pub trait ArtifactStore {
    /// Whether an artifact for this slug already exists.
    fn exists(&self, slug: &str) -> bool;

    /// Enumerate all stored slugs. Called once per run; the result is a
    /// point-in-time snapshot, not refreshed mid-run.
    fn list_slugs(&self) -> io::Result<HashSet<String>>;

    /// Persist an artifact, returning the path it now lives at.
    fn write(&self, slug: &str, content: &str) -> io::Result<PathBuf>;

    /// The path an artifact for this slug lives at (or would live at).
    fn path_for(&self, slug: &str) -> PathBuf;
}

/// Directory-backed store: one file per slug, fixed extension.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
    ext: &'static str,
}

impl FsStore {
    pub fn new(dir: impl Into<PathBuf>, ext: &'static str) -> Self {
        Self { dir: dir.into(), ext }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FsStore {
    fn exists(&self, slug: &str) -> bool {
        self.path_for(slug).exists()
    }

    fn list_slugs(&self) -> io::Result<HashSet<String>> {
        fs::create_dir_all(&self.dir)?;
        let mut slugs = HashSet::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(self.ext)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                slugs.insert(stem.to_string());
            }
        }
        Ok(slugs)
    }

    fn write(&self, slug: &str, content: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(slug);
        fs::write(&path, content)?;
        Ok(path)
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", slug, self.ext))
    }
}

/// In-memory store double, per the injectable-store design. Used by
/// orchestrator tests to pre-seed slugs and inspect written artifacts.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: Mutex<std::collections::HashMap<String, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a slug as already ingested.
    pub fn seed(&self, slug: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(slug.to_string(), String::new());
    }

    /// Read back a written artifact (test inspection only).
    pub fn get(&self, slug: &str) -> Option<String> {
        self.entries.lock().unwrap().get(slug).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemStore {
    fn exists(&self, slug: &str) -> bool {
        self.entries.lock().unwrap().contains_key(slug)
    }

    fn list_slugs(&self) -> io::Result<HashSet<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }

    fn write(&self, slug: &str, content: &str) -> io::Result<PathBuf> {
        self.entries
            .lock()
            .unwrap()
            .insert(slug.to_string(), content.to_string());
        Ok(self.path_for(slug))
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        PathBuf::from(format!("mem://{slug}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_roundtrip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path(), "txt");

        assert!(store.list_slugs().unwrap().is_empty());
        assert!(!store.exists("ep-one"));

        let path = store.write("ep-one", "hello").unwrap();
        assert!(path.ends_with("ep-one.txt"));
        assert!(store.exists("ep-one"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        store.write("ep-two", "world").unwrap();
        let slugs = store.list_slugs().unwrap();
        assert_eq!(slugs.len(), 2);
        assert!(slugs.contains("ep-one") && slugs.contains("ep-two"));
    }

    #[test]
    fn fs_store_ignores_foreign_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("summary.md"), "x").unwrap();
        fs::write(dir.path().join("episode.txt"), "x").unwrap();

        let store = FsStore::new(dir.path(), "txt");
        let slugs = store.list_slugs().unwrap();
        assert_eq!(slugs.len(), 1);
        assert!(slugs.contains("episode"));
    }

    #[test]
    fn fs_store_creates_missing_dir_on_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path().join("raw"), "txt");
        assert!(store.list_slugs().unwrap().is_empty());
        assert!(dir.path().join("raw").is_dir());
    }

    #[test]
    fn mem_store_seeding_and_inspection() {
        let store = MemStore::new();
        store.seed("already-there");
        assert!(store.exists("already-there"));

        store.write("fresh", "content").unwrap();
        assert_eq!(store.get("fresh").as_deref(), Some("content"));
        assert_eq!(store.list_slugs().unwrap().len(), 2);
    }
}
