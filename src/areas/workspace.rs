use crate::artifacts::index::index_entry::EntryMetadata;
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// Working-tree file access
///
/// All paths given to and returned by the workspace are relative to its root
/// unless noted otherwise.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all files under `root_file_path` (or the whole tree), relative to
    /// the workspace root; a plain file lists as itself
    pub fn list_files(&self, root_file_path: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
        let root_file_path = match root_file_path {
            Some(p) => std::fs::canonicalize(p)?,
            None => self.path.clone().into(),
        };

        if !root_file_path.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", root_file_path);
        }

        if root_file_path.is_dir() {
            Ok(WalkDir::new(&root_file_path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| self.check_if_not_ignored_file_path(entry.path()))
                .collect::<Vec<_>>())
        } else {
            Ok(vec![
                root_file_path
                    .strip_prefix(self.path.as_ref())
                    .map(PathBuf::from)
                    .unwrap_or_default(),
            ])
        }
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                let name_str = name.to_string_lossy();
                IGNORED_PATHS.contains(&name_str.as_ref())
            } else {
                false
            }
        })
    }

    fn check_if_not_ignored_file_path(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() && !Self::is_ignored(path) {
            Some(path.strip_prefix(self.path.as_ref()).ok()?.to_path_buf())
        } else {
            None
        }
    }

    pub fn exists(&self, file_path: &Path) -> bool {
        self.path.join(file_path).exists()
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<String> {
        let file_path = self.path.join(file_path);

        let content = std::fs::read_to_string(file_path)?;

        Ok(content)
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let absolute = self.path.join(file_path);
        let metadata = std::fs::metadata(&absolute)?;

        EntryMetadata::capture(file_path, &absolute, &metadata)
    }

    /// Write file content, creating parent directories as needed and applying
    /// the mode's permission bits
    pub fn write_file(&self, file_path: &Path, data: &str, mode: u32) -> anyhow::Result<()> {
        let path = self.path.join(file_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directories for {:?}", file_path)
            })?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open file: {:?}", file_path))?;

        file.write_all(data.as_bytes())
            .with_context(|| format!("Failed to write to file: {:?}", file_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(mode);
            std::fs::set_permissions(&path, permissions)
                .with_context(|| format!("Failed to set permissions for file: {:?}", file_path))?;
        }

        Ok(())
    }

    /// Move an existing file aside before it is overwritten
    ///
    /// The first backup of `a` lands at `a.orig`; when that name is taken the
    /// next free `a.<n>.orig` is used. Returns the backup's relative path.
    pub fn backup_file(&self, file_path: &Path) -> anyhow::Result<PathBuf> {
        let backup_path = self.next_backup_path(file_path)?;

        std::fs::rename(self.path.join(file_path), self.path.join(&backup_path))
            .with_context(|| format!("Failed to back up file: {:?}", file_path))?;

        Ok(backup_path)
    }

    fn next_backup_path(&self, file_path: &Path) -> anyhow::Result<PathBuf> {
        let name = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {:?}", file_path))?;

        let candidate = file_path.with_file_name(format!("{}.orig", name));
        if !self.exists(&candidate) {
            return Ok(candidate);
        }

        for n in 0.. {
            let candidate = file_path.with_file_name(format!("{}.{}.orig", name, n));
            if !self.exists(&candidate) {
                return Ok(candidate);
            }
        }

        unreachable!()
    }
}
