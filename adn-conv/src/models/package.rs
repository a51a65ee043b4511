//! In-memory artifact package and its archive encoding

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("duplicate artifact path: {0}")]
    DuplicateEntry(String),

    #[error("archive encoding failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("descriptor encoding failed: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("archive write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Relative path → bytes, ordered by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; paths must be unique within a package
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) -> Result<(), PackageError> {
        let path = path.into();
        if self.entries.contains_key(&path) {
            return Err(PackageError::DuplicateEntry(path));
        }
        self.entries.insert(path, bytes);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as a ZIP archive
    ///
    /// Entries are stored uncompressed in path order with a fixed timestamp,
    /// so equal packages always encode to equal bytes.
    pub fn to_archive(&self) -> Result<Vec<u8>, PackageError> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for (path, bytes) in &self.entries {
            writer.start_file(path.as_str(), entry_options())?;
            writer.write_all(bytes)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample() -> Package {
        let mut package = Package::new();
        package.insert("docs/README.md", b"# Preset".to_vec()).unwrap();
        package.insert("luts/a.cube", b"LUT_3D_SIZE 2".to_vec()).unwrap();
        package
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let mut package = sample();
        let err = package.insert("docs/README.md", Vec::new()).unwrap_err();
        assert!(matches!(err, PackageError::DuplicateEntry(_)));
        assert_eq!(package.len(), 2);
    }

    #[test]
    fn test_archive_is_deterministic() {
        let first = sample().to_archive().unwrap();
        let second = sample().to_archive().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_archive_contains_every_entry() {
        let bytes = sample().to_archive().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = String::new();
        archive
            .by_name("luts/a.cube")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "LUT_3D_SIZE 2");
    }
}
