//! Exclusion rules (gitignore syntax)
//!
//! Three layers, leaves first:
//!
//! - `glob`: shell-style glob matching primitive
//! - `pattern`: one parsed exclusion rule with anchoring/negation/origin
//! - `exclude`: per-repository rule aggregation with directory precedence
//!
//! Rules are evaluated as one flat list built root-to-leaf; the last matching
//! pattern wins, and a negated last match un-excludes the path.

pub mod exclude;
pub mod glob;
pub mod pattern;

/// Name of the per-directory exclusion file
pub const EXCLUDE_FILE_NAME: &str = ".gitignore";

/// Repository-wide exclusion file, relative to the `.git` directory
pub const REPO_EXCLUDE_FILE: &str = "info/exclude";
