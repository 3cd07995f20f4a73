//! File-system probes consumed by module resolution.
//!
//! Resolution never touches the disk directly. Everything it learns about the
//! outside world comes through a [`ModuleResolutionHost`], which keeps the
//! resolver testable without a real file system and lets an embedding
//! compiler plug in its own virtual file system.

use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// The two probes module resolution is parameterized with.
pub trait ModuleResolutionHost {
    /// Whether `path` names an existing regular file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Contents of `path`, or `None` if it cannot be read.
    fn read_file(&self, path: &Path) -> Option<String>;
}

impl<H: ModuleResolutionHost + ?Sized> ModuleResolutionHost for &H {
    fn file_exists(&self, path: &Path) -> bool {
        (**self).file_exists(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        (**self).read_file(path)
    }
}

/// A pair of closures `(file_exists, read_file)` is a host.
impl<E, R> ModuleResolutionHost for (E, R)
where
    E: Fn(&Path) -> bool,
    R: Fn(&Path) -> Option<String>,
{
    fn file_exists(&self, path: &Path) -> bool {
        (self.0)(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        (self.1)(path)
    }
}

/// Probes backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl ModuleResolutionHost for RealFileSystem {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// An in-memory file map.
///
/// Paths are matched exactly as given, so callers should insert the same
/// normalized absolute paths the resolver will probe.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    files: FxHashMap<PathBuf, String>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Builder-style [`add_file`](Self::add_file).
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.add_file(path, contents);
        self
    }
}

impl ModuleResolutionHost for InMemoryHost {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        self.files.get(path).cloned()
    }
}
