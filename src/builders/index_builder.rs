//! Staged index mutation
//!
//! Collects add/delete/move operations and applies them all in `write()`:
//! file content is hashed into the object store, entries are inserted or
//! removed in path-sorted order, and the index is persisted atomically. A
//! builder dropped before `write()` has no side effects.

use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::monitor::file_monitor::lock;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Object;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Operation {
    Add(PathBuf),
    Delete(PathBuf),
    Move { from: PathBuf, to: PathBuf },
}

/// Builder over the staged file index
pub struct IndexBuilder<'r> {
    repository: &'r Repository,
    operations: Vec<Operation>,
}

impl<'r> IndexBuilder<'r> {
    pub fn new(repository: &'r Repository) -> Self {
        IndexBuilder {
            repository,
            operations: Vec::new(),
        }
    }

    /// Stage one file (or every non-excluded file under a directory)
    pub fn add(mut self, path: impl Into<PathBuf>) -> Self {
        self.operations.push(Operation::Add(path.into()));
        self
    }

    pub fn add_all(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        for path in paths {
            self.operations.push(Operation::Add(path.into()));
        }
        self
    }

    /// Unstage one path; absent entries are a no-op
    pub fn delete(mut self, path: impl Into<PathBuf>) -> Self {
        self.operations.push(Operation::Delete(path.into()));
        self
    }

    pub fn delete_all(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        for path in paths {
            self.operations.push(Operation::Delete(path.into()));
        }
        self
    }

    /// Record a rename: drop the entry at `from`, stage `to`
    ///
    /// The caller is responsible for the filesystem rename itself; `to` must
    /// already exist on disk when `write()` runs, or the whole operation
    /// aborts without touching the index.
    pub fn move_file(mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        self.operations.push(Operation::Move {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Apply all recorded operations and persist the index atomically
    ///
    /// With no recorded mutations the on-disk index is reproduced
    /// byte-for-byte.
    pub fn write(self) -> anyhow::Result<()> {
        let index = self.repository.index();
        let mut index = lock(&index);
        index.rehydrate()?;

        for operation in &self.operations {
            match operation {
                Operation::Add(path) => {
                    for file in self.expand(path)? {
                        self.stage_file(&mut index, &file)?;
                    }
                }
                Operation::Delete(path) => {
                    index.remove(self.relative(path))?;
                }
                Operation::Move { from, to } => {
                    let to = self.relative(to);
                    if !self.repository.workspace().exists(&to) {
                        anyhow::bail!("{}", to.display());
                    }
                    index.remove(self.relative(from))?;
                    self.stage_file(&mut index, &to)?;
                }
            }
        }

        index.write_updates()
    }

    /// Normalize a caller path to be workspace-relative
    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.repository.path())
            .unwrap_or(path)
            .to_path_buf()
    }

    /// Expand a path into the staged file list
    ///
    /// Directories expand to every file beneath them, minus exclusion-rule
    /// hits; explicitly named files are staged regardless of exclusion rules.
    /// Paths missing on disk are skipped.
    fn expand(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let relative = self.relative(path);
        let absolute = self.repository.path().join(&relative);

        if absolute.is_dir() {
            let files = self
                .repository
                .workspace()
                .list_files(Some(absolute))?
                .into_iter()
                .filter(|file| !self.repository.excludes().is_excluded(file))
                .collect();
            Ok(files)
        } else if absolute.is_file() {
            Ok(vec![relative])
        } else {
            tracing::warn!("cannot stage {}: no such file", relative.display());
            Ok(Vec::new())
        }
    }

    /// Hash one file into the object store and record its index entry
    fn stage_file(&self, index: &mut Index, path: &Path) -> anyhow::Result<()> {
        let workspace = self.repository.workspace();

        let data = workspace.read_file(path)?;
        let stat = workspace.stat_file(path)?;

        let blob = Blob::new(data, stat.mode.clone().try_into()?);
        let blob_id = blob.object_id()?;

        self.repository.database().store(blob)?;
        index.add(IndexEntry::new(path.to_path_buf(), blob_id, stat))?;

        Ok(())
    }
}
