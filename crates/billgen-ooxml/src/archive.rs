//! In-memory ZIP packages
//!
//! Used both for the parts of a DOCX file and for the per-dataset output
//! archive. Parts are kept sorted and written with a fixed timestamp, so
//! identical contents always produce identical bytes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::error::{OoxmlError, Result};

/// Unpacked ZIP package
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartArchive {
    /// All files in the archive, keyed by path
    files: BTreeMap<String, Vec<u8>>,
}

impl PartArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and unpack a ZIP file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Unpack from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get a file that must be present
    pub fn require(&self, path: &str) -> Result<&[u8]> {
        self.get(path)
            .ok_or_else(|| OoxmlError::MissingFile(path.to_string()))
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// List all files in the archive, sorted
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Set or update a file's contents
    ///
    /// Paths use `/` separators and must be relative.
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) -> Result<()> {
        let path = path.into();
        if path.is_empty()
            || path.starts_with('/')
            || path.contains('\\')
            || path.split('/').any(|seg| seg.is_empty() || seg == "..")
        {
            return Err(OoxmlError::InvalidPath(path));
        }
        self.files.insert(path, contents);
        Ok(())
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) -> Result<()> {
        self.set(path, contents.into().into_bytes())
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the archive into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        // BTreeMap iteration is sorted, so entry order is deterministic
        for (path, contents) in &self.files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_operations() {
        let mut archive = PartArchive::new();

        archive.set_string("test.xml", "<root/>").unwrap();
        assert!(archive.contains("test.xml"));
        assert_eq!(archive.get_string("test.xml"), Some("<root/>".to_string()));

        archive.remove("test.xml");
        assert!(!archive.contains("test.xml"));
        assert!(matches!(
            archive.require("test.xml"),
            Err(OoxmlError::MissingFile(_))
        ));
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let mut archive = PartArchive::new();
        for bad in ["", "/abs.xml", "a/../b.xml", "dir//file", "win\\path"] {
            assert!(archive.set(bad, Vec::new()).is_err(), "accepted {:?}", bad);
        }
        assert!(archive.set("pdf/Combined Bill.pdf", Vec::new()).is_ok());
    }

    #[test]
    fn test_roundtrip_through_bytes() {
        let mut archive = PartArchive::new();
        archive.set_string("html/Summary.html", "<!DOCTYPE html>").unwrap();
        archive.set("pdf/Summary.pdf", b"%PDF-1.5".to_vec()).unwrap();

        let bytes = archive.to_bytes().unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let restored = PartArchive::from_bytes(&bytes).unwrap();
        assert_eq!(restored, archive);
        assert_eq!(
            restored.file_list().collect::<Vec<_>>(),
            vec!["html/Summary.html", "pdf/Summary.pdf"]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = |order: &[&str]| {
            let mut archive = PartArchive::new();
            for name in order {
                archive.set_string(*name, format!("content of {}", name)).unwrap();
            }
            archive.to_bytes().unwrap()
        };
        assert_eq!(build(&["b.txt", "a.txt"]), build(&["a.txt", "b.txt"]));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bill.zip");
        let mut archive = PartArchive::new();
        archive.set_string("docx/readme.txt", "hello").unwrap();
        archive.write_to_file(&path).unwrap();

        let restored = PartArchive::open(&path).unwrap();
        assert_eq!(restored.get("docx/readme.txt"), Some(&b"hello"[..]));
    }
}
