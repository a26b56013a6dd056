//! File access abstraction.
//!
//! The compiler never touches the filesystem directly; everything flows
//! through a [`FileLookup`]. Production use wires in [`DiskLookup`]; tests
//! use [`MemoryLookup`] to run whole compiles without a disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub trait FileLookup: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Raw bytes, for hashing and image input.
    fn read_raw(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Whole-file text, for source parsing.
    fn open_text(&self, path: &Path) -> io::Result<String>;

    /// Writable sink, creating parent directories as needed.
    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;
}

/// Straightforward `std::fs` implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiskLookup;

impl FileLookup for DiskLookup {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_raw(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn open_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Box::new(fs::File::create(path)?))
    }
}

type WrittenFiles = Arc<Mutex<FxHashMap<PathBuf, Vec<u8>>>>;

/// In-memory lookup for tests. Seed it with sources, run a compile, then
/// inspect what was written.
#[derive(Clone, Default)]
pub struct MemoryLookup {
    files: FxHashMap<PathBuf, Vec<u8>>,
    written: WrittenFiles,
}

impl MemoryLookup {
    pub fn new() -> MemoryLookup {
        MemoryLookup::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> MemoryLookup {
        self.files.insert(path.into(), text.into().into_bytes());
        self
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into().into_bytes());
    }

    /// Text written to `path` through `open_write`, if any.
    pub fn written(&self, path: &Path) -> Option<String> {
        self.written
            .lock()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.written.lock().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl FileLookup for MemoryLookup {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_raw(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn open_text(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_raw(path)?;
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }

    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(MemorySink {
            path: path.to_path_buf(),
            buffer: Vec::new(),
            store: Arc::clone(&self.written),
        }))
    }
}

struct MemorySink {
    path: PathBuf,
    buffer: Vec<u8>,
    store: WrittenFiles,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        let buffer = std::mem::take(&mut self.buffer);
        self.store.lock().insert(self.path.clone(), buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_lookup_round_trips() {
        let lookup = MemoryLookup::new().with_file("a.icss", ".a { }");
        assert!(lookup.exists(Path::new("a.icss")));
        assert!(!lookup.exists(Path::new("b.icss")));
        assert_eq!(lookup.open_text(Path::new("a.icss")).unwrap(), ".a { }");
    }

    #[test]
    fn memory_writes_land_after_drop() {
        let lookup = MemoryLookup::new();
        {
            let mut sink = lookup.open_write(Path::new("out.css")).unwrap();
            sink.write_all(b".a{color:red}").unwrap();
        }
        assert_eq!(
            lookup.written(Path::new("out.css")).as_deref(),
            Some(".a{color:red}")
        );
    }

    #[test]
    fn disk_lookup_reads_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.css");
        {
            let mut sink = DiskLookup.open_write(&path).unwrap();
            sink.write_all(b"x").unwrap();
        }
        assert!(DiskLookup.exists(&path));
        assert_eq!(DiskLookup.open_text(&path).unwrap(), "x");
    }
}
