// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::FileSystem;

/// In-memory file system. Directories exist implicitly once a file is
/// added below them, or explicitly through [`MockFileSystem::add_dir`].
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    inner: Arc<Mutex<MockTree>>,
}

#[derive(Debug, Default)]
struct MockTree {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MockTree {
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) -> &Self {
        let path = path.as_ref();
        let mut tree = self.tree();
        tree.add_ancestors(path);
        tree.files.insert(path.to_path_buf(), content.into());
        self
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        let mut tree = self.tree();
        tree.add_ancestors(path);
        tree.dirs.insert(path.to_path_buf());
        self
    }

    fn tree(&self) -> MutexGuard<'_, MockTree> {
        // A poisoned lock only means another test thread panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let tree = self.tree();
        match tree.files.get(path) {
            Some(content) => Ok(content.clone()),
            None if tree.dirs.contains(path) => Err(anyhow!("is a directory: {}", path.display())),
            None => Err(anyhow!("file not found: {}", path.display())),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.tree().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.tree().dirs.contains(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let tree = self.tree();
        if !tree.dirs.contains(path) {
            return Err(anyhow!("not a directory: {}", path.display()));
        }
        let children = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children)
    }
}
