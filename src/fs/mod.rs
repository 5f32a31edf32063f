// src/fs/mod.rs

//! Filesystem seam used by the queue and the stores.
//!
//! The trigger queue encodes job state as directory membership, so the
//! operations here are the whole persistence model: atomic replace for the
//! status record, append for the activity log, rename for state changes.

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

pub mod mock;

pub use mock::MockFileSystem;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Raw bytes, for content whose encoding is not trusted.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace `path` so readers see either the old or the new content.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Append to `path`, creating it if needed.
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Move `from` to `to`. Fails if `from` does not exist.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
///
/// Files are created owner-only (0600, directories 0700) on unix: trigger
/// payloads can carry repository metadata.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.create_dir_all(dir)?;

        // NamedTempFile is created 0600 already.
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {:?}", dir))?;
        tmp.write_all(contents)
            .with_context(|| format!("writing temp file for {:?}", path))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("persisting {:?}", path))?;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("opening {:?} for append", path))?;
        file.write_all(contents)
            .with_context(|| format!("appending to {:?}", path))?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).with_context(|| format!("renaming {:?} -> {:?}", from, to))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(path)
            .with_context(|| format!("creating dir {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
