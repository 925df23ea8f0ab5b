//! Injected filesystem capability
//!
//! The core never touches a concrete filesystem API directly; everything
//! goes through this trait. [`OsFileSystem`] is the production
//! implementation, [`MemoryFileSystem`] backs tests and dry runs.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{BlueprintResult, GenerationError};

pub trait FileSystem: Send + Sync {
    fn read(&self, path: &Path) -> BlueprintResult<String>;
    fn write(&self, path: &Path, contents: &str) -> BlueprintResult<()>;
    fn exists(&self, path: &Path) -> bool;
    fn list(&self, dir: &Path) -> BlueprintResult<Vec<PathBuf>>;
    fn create_dir_all(&self, dir: &Path) -> BlueprintResult<()>;
    fn remove(&self, path: &Path) -> BlueprintResult<()>;
}

fn io_error(path: &Path, err: &io::Error) -> GenerationError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        GenerationError::PermissionDenied {
            path: path.display().to_string(),
        }
    } else {
        GenerationError::WriteFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Real filesystem access
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> BlueprintResult<String> {
        std::fs::read_to_string(path).map_err(|e| io_error(path, &e).into())
    }

    fn write(&self, path: &Path, contents: &str) -> BlueprintResult<()> {
        std::fs::write(path, contents).map_err(|e| io_error(path, &e).into())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list(&self, dir: &Path) -> BlueprintResult<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, &e))?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry.map_err(|e| io_error(dir, &e))?.path());
        }
        paths.sort();
        Ok(paths)
    }

    fn create_dir_all(&self, dir: &Path) -> BlueprintResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, &e).into())
    }

    fn remove(&self, path: &Path) -> BlueprintResult<()> {
        std::fs::remove_file(path).map_err(|e| io_error(path, &e).into())
    }
}

/// In-memory filesystem for tests
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<Vec<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.into());
        self
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> BlueprintResult<String> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            GenerationError::WriteFailed {
                path: path.display().to_string(),
                reason: "not found".to_string(),
            }
            .into()
        })
    }

    fn write(&self, path: &Path, contents: &str) -> BlueprintResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    // A directory exists if it was created explicitly or is an ancestor of
    // any stored file or created directory.
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return true;
        }
        if files.keys().any(|p| p.as_path() != path && p.starts_with(path)) {
            return true;
        }
        self.dirs
            .lock()
            .unwrap()
            .iter()
            .any(|d| d == path || d.starts_with(path))
    }

    fn list(&self, dir: &Path) -> BlueprintResult<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn create_dir_all(&self, dir: &Path) -> BlueprintResult<()> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn remove(&self, path: &Path) -> BlueprintResult<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}
