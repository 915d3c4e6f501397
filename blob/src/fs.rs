//! Filesystem blob store implementation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{BlobError, BlobInfo, BlobResult, BlobStore, path_components};

/// A blob store that keeps every blob as a file below `root`.
///
/// The logical path `container/1/2/12345.opus` is stored at
/// `{root}/container/1/2/12345.opus`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

fn io_error(path: &Path, source: io::Error) -> BlobError {
    BlobError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory is created if missing.
    pub fn open<P: Into<PathBuf>>(root: P) -> BlobResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> BlobResult<PathBuf> {
        let mut full = self.root.clone();
        for part in path_components(path)? {
            full.push(part);
        }
        Ok(full)
    }

    fn walk(&self, dir: &Path, logical: &str, out: &mut Vec<BlobInfo>) -> BlobResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_error(dir, e)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_error(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = format!("{logical}/{name}");
            let meta = entry.metadata().map_err(|e| io_error(&entry.path(), e))?;
            if meta.is_dir() {
                self.walk(&entry.path(), &child, out)?;
            } else if meta.is_file() {
                let modified = meta.modified().map_err(|e| io_error(&entry.path(), e))?;
                out.push(BlobInfo {
                    path: child,
                    modified: DateTime::<Utc>::from(modified),
                });
            }
        }
        Ok(())
    }
}

impl BlobStore for FsBlobStore {
    fn prepare(&self, dir: &str) -> BlobResult<()> {
        let full = self.resolve(dir)?;
        fs::create_dir_all(&full).map_err(|e| io_error(&full, e))
    }

    fn put(&self, path: &str, data: &[u8]) -> BlobResult<()> {
        let full = self.resolve(path)?;
        fs::write(&full, data).map_err(|e| io_error(&full, e))
    }

    fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>> {
        let full = self.resolve(path)?;
        match fs::read(&full) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&full, e)),
        }
    }

    fn exists(&self, path: &str) -> BlobResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    fn delete(&self, path: &str) -> BlobResult<bool> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&full, e)),
        }
    }

    fn clean(&self, dir: &str) -> BlobResult<()> {
        let parts = path_components(dir)?;
        // Never remove the container itself.
        for depth in (2..=parts.len()).rev() {
            let mut full = self.root.clone();
            for part in &parts[..depth] {
                full.push(part);
            }
            match fs::remove_dir(&full) {
                Ok(()) => debug!(dir = %full.display(), "blob: removed empty directory"),
                // Not empty, already gone, or otherwise busy: stop climbing.
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn list(&self, dir: &str) -> BlobResult<Vec<BlobInfo>> {
        let logical = path_components(dir)?.join("/");
        let full = self.resolve(dir)?;
        let mut out = Vec::new();
        self.walk(&full, &logical, &mut out)?;
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}
