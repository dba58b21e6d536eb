//! A minimal git working-tree synchronization engine
//!
//! Maintains a staged file index, writes content-addressed objects (blobs,
//! trees, commits), restores working-tree files from a revision, and decides
//! which files are excluded from version control via gitignore-style rules.
//!
//! Callers configure a builder, invoke its terminal method, and the builder
//! hashes and reads through the object store while mutating index, working
//! tree, and ref state:
//!
//! ```no_run
//! use twig::areas::repository::Repository;
//! use twig::builders::{CommitBuilder, IndexBuilder};
//!
//! # fn main() -> anyhow::Result<()> {
//! let repository = Repository::open(std::path::Path::new("."))?;
//! repository.init()?;
//!
//! IndexBuilder::new(&repository).add("src/lib.rs").write()?;
//! CommitBuilder::new(&repository)
//!     .author("Jane Doe", "jane@example.com")
//!     .message("Initial import")
//!     .write()?;
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod artifacts;
pub mod builders;
