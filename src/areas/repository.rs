use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::ignore::exclude::ExcludeCache;
use crate::artifacts::monitor::{FileMonitor, NotifyMonitor};
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Branch a fresh repository's HEAD points at
pub const DEFAULT_BRANCH: &str = "master";

/// One repository: working tree plus `.git` state
///
/// Aggregates the workspace, object database, staged index, references and
/// the exclusion cache behind a single handle. Builders borrow a repository
/// and assume single-writer-per-repository discipline; serializing mutating
/// operations is the caller's responsibility.
pub struct Repository {
    path: Box<Path>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
    excludes: ExcludeCache,
}

impl Repository {
    /// Open a repository at `path`, watching its exclusion files with the
    /// platform file monitor
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let monitor = NotifyMonitor::new().context("failed to start file monitor")?;
        Self::open_with_monitor(path, Arc::new(monitor))
    }

    /// Open a repository with a caller-supplied file monitor
    ///
    /// Embedders that already have a change feed plug it in here.
    pub fn open_with_monitor(
        path: &Path,
        monitor: Arc<dyn FileMonitor>,
    ) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;

        let git_path = path.join(".git");
        let index = Index::new(git_path.join("index").into_boxed_path());
        let database = Database::new(git_path.join("objects").into_boxed_path());
        let workspace = Workspace::new(path.clone().into_boxed_path());
        let refs = Refs::new(git_path.clone().into_boxed_path());
        let excludes = ExcludeCache::new(
            path.clone().into_boxed_path(),
            git_path.into_boxed_path(),
            monitor,
        );

        Ok(Repository {
            path: path.into_boxed_path(),
            index: Arc::new(Mutex::new(index)),
            database,
            workspace,
            refs,
            excludes,
        })
    }

    /// Create the `.git` layout for a fresh repository
    ///
    /// Idempotent: re-initializing an existing repository only fills in
    /// whatever is missing.
    pub fn init(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.database.objects_path())
            .context("Failed to create .git/objects directory")?;

        std::fs::create_dir_all(self.refs.heads_path())
            .context("Failed to create .git/refs/heads directory")?;

        std::fs::create_dir_all(self.path.join(".git").join("info"))
            .context("Failed to create .git/info directory")?;

        if !self.refs.head_path().exists() {
            self.refs
                .set_head(
                    DEFAULT_BRANCH,
                    format!("ref: refs/heads/{}", DEFAULT_BRANCH),
                )
                .context("Failed to create initial HEAD reference")?;
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn excludes(&self) -> &ExcludeCache {
        &self.excludes
    }
}
