//! Filesystem wrappers shared by the integration tests.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use treedupe::vfs::{FileReader, Filesystem, StdFilesystem};

/// Counts every `open` call so tests can prove a file was read only once.
#[derive(Default)]
pub struct CountingFilesystem {
    inner: StdFilesystem,
    opens: AtomicUsize,
}

impl CountingFilesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Filesystem for CountingFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        self.inner.size(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn list_children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_children(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn FileReader>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(path)
    }
}

/// Yields directory children in reversed order, standing in for a platform
/// that enumerates differently.
#[derive(Default)]
pub struct ReversingFilesystem {
    inner: StdFilesystem,
}

impl ReversingFilesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Filesystem for ReversingFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        self.inner.size(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn list_children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut children = self.inner.list_children(path)?;
        children.sort();
        children.reverse();
        Ok(children)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn FileReader>> {
        self.inner.open(path)
    }
}

/// Fails every `open` of paths whose file name matches, simulating an
/// unreadable file in the middle of a tree.
pub struct FailingFilesystem {
    inner: StdFilesystem,
    poison_name: String,
}

impl FailingFilesystem {
    pub fn new(poison_name: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: StdFilesystem,
            poison_name: poison_name.to_string(),
        })
    }
}

impl Filesystem for FailingFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        self.inner.size(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.canonicalize(path)
    }

    fn list_children(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_children(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn FileReader>> {
        if path.file_name().is_some_and(|name| name == self.poison_name.as_str()) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "poisoned by test",
            ));
        }
        self.inner.open(path)
    }
}
