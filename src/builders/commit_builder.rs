//! Commit creation
//!
//! Builds a tree from the current index, determines parents from the current
//! branch ref (an unresolvable ref yields a zero-parent commit), writes the
//! tree and commit objects, and repoints the branch ref. Re-running with the
//! same tree, identity, timestamp and message reproduces byte-identical
//! commit text.

use crate::areas::repository::Repository;
use crate::artifacts::monitor::file_monitor::lock;
use crate::artifacts::objects::commit::{Author, Commit, strip_space};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::builders::index_builder::IndexBuilder;
use std::io::Write;
use std::path::PathBuf;

/// Builder for one commit
pub struct CommitBuilder<'r> {
    repository: &'r Repository,
    time: Option<chrono::DateTime<chrono::FixedOffset>>,
    message: String,
    identity: Option<(String, String)>,
    stage: Vec<PathBuf>,
    sink: Option<Box<dyn Write>>,
}

impl<'r> CommitBuilder<'r> {
    pub fn new(repository: &'r Repository) -> Self {
        CommitBuilder {
            repository,
            time: None,
            message: String::new(),
            identity: None,
            stage: Vec::new(),
            sink: None,
        }
    }

    /// Fix the author/committer timestamp (with its timezone offset)
    ///
    /// Defaults to the local time at `write()`.
    pub fn time(mut self, time: chrono::DateTime<chrono::FixedOffset>) -> Self {
        self.time = Some(time);
        self
    }

    /// Set the author/committer identity
    ///
    /// Defaults to `GIT_AUTHOR_NAME` / `GIT_AUTHOR_EMAIL`.
    pub fn author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = text.into();
        self
    }

    /// Stage these files into the index before writing the tree
    pub fn add_all(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.stage.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Attach a diagnostic sink for the human-readable commit summary
    ///
    /// Purely informational; the commit is identical without it.
    pub fn log(mut self, sink: Box<dyn Write>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Write the tree and commit objects and repoint the branch ref
    pub fn write(mut self) -> anyhow::Result<ObjectId> {
        if !self.stage.is_empty() {
            IndexBuilder::new(self.repository)
                .add_all(std::mem::take(&mut self.stage))
                .write()?;
        }

        let index = self.repository.index();
        let mut index = lock(&index);
        index.rehydrate()?;

        let tree = Tree::build(index.entries())?;
        let tree_id = tree.object_id()?;
        let store_tree = &|tree: &Tree| self.repository.database().store(tree.clone());
        tree.traverse(store_tree)?;

        // an unresolvable ref (no prior commits, ref storage absent) means a
        // root commit, not a failure
        let parents: Vec<ObjectId> = self.repository.refs().read_head()?.into_iter().collect();
        let is_root = if parents.is_empty() {
            "(root-commit) "
        } else {
            ""
        };

        let author = self.author_identity()?;
        let message = strip_space(&self.message);

        let commit = Commit::new(parents, tree_id, author, message);
        let commit_id = commit.object_id()?;
        self.repository.database().store(commit.clone())?;
        self.repository.refs().update_head(commit_id.clone())?;

        tracing::debug!("committed {}", commit_id);
        if let Some(sink) = self.sink.as_mut() {
            writeln!(
                sink,
                "[{}{}] {}",
                is_root,
                commit_id.to_short_oid(),
                commit.short_message()
            )?;
        }

        Ok(commit_id)
    }

    fn author_identity(&self) -> anyhow::Result<Author> {
        let author = match &self.identity {
            Some((name, email)) => Author::new(name.clone(), email.clone()),
            None => Author::load_from_env()?,
        };

        Ok(match self.time {
            Some(time) => author.at(time),
            None => author,
        })
    }
}
