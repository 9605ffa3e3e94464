//! Thin filesystem collaborator.
//!
//! The digest engines never touch `std::fs` directly; everything goes
//! through [`Filesystem`] so tests can substitute counting, reordering, or
//! failing filesystems without touching a real disk layout. [`StdFilesystem`]
//! is the production implementation.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Sequential, skippable access to one open file.
pub trait FileReader: Send {
    /// Read up to `buf.len()` bytes from the current position, returning the
    /// number of bytes read (`0` at end of file).
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Move the read cursor `by` bytes forward. Seeking past the end of the
    /// file is allowed; the next read simply returns `0`.
    fn advance(&mut self, by: u64) -> io::Result<()>;
}

/// The filesystem operations the engines need.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a regular file (following symlinks).
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` is a directory (following symlinks).
    fn is_dir(&self, path: &Path) -> bool;

    /// Size of the file in bytes.
    fn size(&self, path: &Path) -> io::Result<u64>;

    /// Resolve symlinks and relative segments to the canonical absolute path.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Immediate children of a directory, in whatever order the platform
    /// yields them. No recursion, and the directory itself is not included.
    fn list_children(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Open a file for sequential reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn FileReader>>;
}

/// Production [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn list_children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn FileReader>> {
        Ok(Box::new(StdFileReader {
            file: File::open(path)?,
        }))
    }
}

struct StdFileReader {
    file: File,
}

impl FileReader for StdFileReader {
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn advance(&mut self, by: u64) -> io::Result<()> {
        let by = i64::try_from(by).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek offset does not fit in i64")
        })?;
        self.file.seek(SeekFrom::Current(by)).map(|_| ())
    }
}
