// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    /// Number of completed writes (atomic or append) per path.
    writes: HashMap<PathBuf, usize>,
    /// Renames whose destination sits in one of these directories fail.
    broken_rename_targets: HashSet<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// All operations take one lock, so `rename` is atomic with respect to
/// every other operation, like `rename(2)` on a single filesystem.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.lock().dirs.insert(PathBuf::from("/"));
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            insert_dir_chain(&mut state.dirs, parent);
        }
        state.files.insert(path, content.into());
    }

    /// How many times `path` has been written through the trait.
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.lock().writes.get(path.as_ref()).copied().unwrap_or(0)
    }

    /// Make every rename into `dir` fail from now on.
    pub fn break_renames_into(&self, dir: impl AsRef<Path>) {
        self.lock()
            .broken_rename_targets
            .insert(dir.as_ref().to_path_buf());
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not wedge every other assertion.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn insert_dir_chain(dirs: &mut BTreeSet<PathBuf>, dir: &Path) {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

fn parent_of(path: &Path) -> Result<&Path> {
    path.parent()
        .ok_or_else(|| anyhow!("path has no parent: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        String::from_utf8(self.read(path)?)
            .map_err(|e| anyhow!("Invalid UTF-8 in {:?}: {}", path, e))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.lock();
        match state.files.get(path) {
            Some(content) => Ok(content.clone()),
            None if state.dirs.contains(path) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock();
        insert_dir_chain(&mut state.dirs, parent_of(path)?);
        state.files.insert(path.to_path_buf(), contents.to_vec());
        *state.writes.entry(path.to_path_buf()).or_default() += 1;
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock();
        let parent = parent_of(path)?;
        if !state.dirs.contains(parent) {
            return Err(anyhow!("Parent directory missing for {:?}", path));
        }
        state
            .files
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(contents);
        *state.writes.entry(path.to_path_buf()).or_default() += 1;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.lock();
        let target_dir = parent_of(to)?;
        if state.broken_rename_targets.contains(target_dir) {
            return Err(anyhow!("injected rename failure into {:?}", target_dir));
        }
        if !state.dirs.contains(target_dir) {
            return Err(anyhow!("Target directory missing: {:?}", target_dir));
        }
        let content = state
            .files
            .remove(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        insert_dir_chain(&mut self.lock().dirs, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        if !state.dirs.contains(path) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        let files = state.files.keys().filter(|p| p.parent() == Some(path));
        let dirs = state.dirs.iter().filter(|p| p.parent() == Some(path));
        Ok(files.chain(dirs).cloned().collect())
    }
}
