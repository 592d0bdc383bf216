//! Lazy, per-file migration content loading.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Source of migration file bytes, read lazily per file during execution.
pub trait ContentSource: Send + Sync {
    fn read(&self, filename: &str) -> io::Result<Vec<u8>>;
}

/// Reads migration files from a directory tree, the production source.
pub struct FsContentSource {
    pub root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentSource for FsContentSource {
    fn read(&self, filename: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(filename))
    }
}

/// In-memory content source, for tests and for embedding migrations at
/// compile time.
#[derive(Default, Clone)]
pub struct MemoryContentSource {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(filename.into(), content.into());
        self
    }
}

impl ContentSource for MemoryContentSource {
    fn read(&self, filename: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(filename)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, filename.to_string()))
    }
}

/// Whitespace-only content counts as a no-op but the version is still
/// recorded.
pub fn is_whitespace_only(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_whitespace_only_content() {
        assert!(is_whitespace_only(b""));
        assert!(is_whitespace_only(b"   \n\t  \n"));
        assert!(!is_whitespace_only(b"SELECT 1;"));
    }

    #[test]
    fn memory_source_round_trips() {
        let src = MemoryContentSource::new().with_file("a.sql", "CREATE TABLE t(id INT);");
        assert_eq!(src.read("a.sql").unwrap(), b"CREATE TABLE t(id INT);");
        assert!(src.read("missing.sql").is_err());
    }
}
