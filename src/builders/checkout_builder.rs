//! Working-tree file restoration
//!
//! Restores blob content from a resolved revision into the working tree.
//! Both failure modes validate eagerly: an unresolvable revision fails in
//! `revision()` with the name as the entire error message, and a source path
//! missing from the tree fails in `file()`/`files()` with the relative path
//! as the entire message. `checkout()` then only performs writes.

use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::builders::revision::resolve_tree_oid;
use std::path::PathBuf;

/// One validated (source-in-tree, destination-on-disk) mapping
#[derive(Debug)]
struct CheckoutTarget {
    source: PathBuf,
    destination: PathBuf,
    entry: DatabaseEntry,
}

/// Builder for restoring files from a revision
pub struct CheckoutBuilder<'r> {
    repository: &'r Repository,
    tree_oid: Option<ObjectId>,
    targets: Vec<CheckoutTarget>,
    backup: bool,
}

impl std::fmt::Debug for CheckoutBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutBuilder")
            .field("tree_oid", &self.tree_oid)
            .field("targets", &self.targets)
            .field("backup", &self.backup)
            .finish_non_exhaustive()
    }
}

impl<'r> CheckoutBuilder<'r> {
    pub fn new(repository: &'r Repository) -> Self {
        CheckoutBuilder {
            repository,
            tree_oid: None,
            targets: Vec::new(),
            backup: false,
        }
    }

    /// Resolve `name` to the tree to restore from
    ///
    /// Fails immediately when the name does not resolve; the error message is
    /// exactly the unresolved name.
    pub fn revision(mut self, name: &str) -> anyhow::Result<Self> {
        self.tree_oid = Some(resolve_tree_oid(self.repository, name)?);
        Ok(self)
    }

    /// Record one source-to-destination mapping
    ///
    /// The source path is validated against the resolved tree now; a missing
    /// path fails with the relative source path as the entire error message.
    pub fn file(
        mut self,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let source = source.into();
        let tree_oid = self
            .tree_oid
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no revision configured"))?;

        let entry = self
            .repository
            .database()
            .find_entry(tree_oid, &source)?
            .filter(|entry| !entry.is_tree())
            .ok_or_else(|| anyhow::anyhow!("{}", source.display()))?;

        self.targets.push(CheckoutTarget {
            source,
            destination: destination.into(),
            entry,
        });

        Ok(self)
    }

    /// Record several mappings; the first missing source fails the call
    pub fn files(
        self,
        pairs: impl IntoIterator<Item = (PathBuf, PathBuf)>,
    ) -> anyhow::Result<Self> {
        pairs
            .into_iter()
            .try_fold(self, |builder, (source, destination)| {
                builder.file(source, destination)
            })
    }

    /// Keep displaced destination files as `<name>.orig` backups
    pub fn backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    /// Write every recorded mapping into the working tree
    ///
    /// Parent directories are created as needed and the destination's
    /// executable bit follows the tree entry's mode. With backups enabled the
    /// displaced file is renamed aside before the new content lands, so it
    /// stays on disk for as long as the original is being replaced.
    pub fn checkout(self) -> anyhow::Result<()> {
        let workspace = self.repository.workspace();

        for target in &self.targets {
            let blob = self
                .repository
                .database()
                .parse_object_as_blob(&target.entry.oid)?
                .ok_or_else(|| anyhow::anyhow!("{}", target.source.display()))?;

            if self.backup && workspace.exists(&target.destination) {
                let kept = workspace.backup_file(&target.destination)?;
                tracing::debug!(
                    "backed up {} to {}",
                    target.destination.display(),
                    kept.display()
                );
            }

            workspace.write_file(
                &target.destination,
                blob.content(),
                target.entry.mode.as_u32(),
            )?;
        }

        Ok(())
    }
}
