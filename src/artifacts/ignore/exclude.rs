//! Per-repository exclusion rule aggregation
//!
//! For a path `a/b/c.txt` the applicable exclusion files are, in evaluation
//! order: the repository-wide `info/exclude`, the root `.gitignore`, then the
//! `.gitignore` of `a` and of `a/b`. The concatenation forms one flat ordered
//! rule list; the last matching pattern wins, and a negated last match
//! un-excludes the path. No match at all means "not excluded".
//!
//! Each exclusion file's parsed rules are cached through a MonitoredFileMap,
//! so unchanged files are never re-read and a change to one file invalidates
//! exactly that file's rules.

use crate::artifacts::ignore::pattern::PathPattern;
use crate::artifacts::ignore::{EXCLUDE_FILE_NAME, REPO_EXCLUDE_FILE};
use crate::artifacts::monitor::{FileMonitor, MonitoredFileMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Debounce window for exclusion-file change notifications
const EXCLUDE_DEBOUNCE: Duration = Duration::from_millis(200);

/// The ordered rules of one exclusion file
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    patterns: Vec<PathPattern>,
}

impl RuleSet {
    /// Parse exclusion-file content; malformed lines are skipped
    pub fn parse(content: &str, origin: &Path) -> Self {
        RuleSet {
            patterns: content
                .lines()
                .filter_map(|line| PathPattern::parse(line, origin))
                .collect(),
        }
    }

    /// Load an exclusion file from disk; a missing file is an empty rule set
    pub fn load(file: &Path, origin: &Path) -> Self {
        match std::fs::read_to_string(file) {
            Ok(content) => Self::parse(&content, origin),
            Err(_) => RuleSet::default(),
        }
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}

/// Per-repository cache of exclusion rules with directory precedence
pub struct ExcludeCache {
    /// Working-tree root
    root: Box<Path>,
    /// `.git` directory (holds the repository-wide exclusion file)
    git_path: Box<Path>,
    /// Parsed rules per exclusion file, invalidated on file change
    rule_sets: MonitoredFileMap<RuleSet>,
}

impl ExcludeCache {
    pub fn new(root: Box<Path>, git_path: Box<Path>, monitor: Arc<dyn FileMonitor>) -> Self {
        ExcludeCache {
            root,
            git_path,
            rule_sets: MonitoredFileMap::new(monitor, EXCLUDE_DEBOUNCE),
        }
    }

    /// Is this repository-relative path excluded from version control?
    ///
    /// The final component counts as a directory when it is one on disk.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.strip_prefix(self.root.as_ref()).unwrap_or(path);
        let is_dir = self.root.join(path).is_dir();

        self.is_excluded_as(path, is_dir)
    }

    /// Is this path excluded, with the caller deciding whether the final
    /// component names a directory?
    ///
    /// Ancestors within the path always count as directories, whether or not
    /// they exist on disk yet.
    pub fn is_excluded_as(&self, path: &Path, is_dir: bool) -> bool {
        let path = path.strip_prefix(self.root.as_ref()).unwrap_or(path);

        let mut last_match: Option<bool> = None;
        for (file, origin) in self.exclusion_files(path) {
            let rules = self.rule_set(&file, &origin);
            for pattern in rules.patterns() {
                if pattern.matches(path, is_dir) {
                    last_match = Some(pattern.is_negated());
                }
            }
        }

        matches!(last_match, Some(false))
    }

    /// The chain of exclusion files applicable to `path`, outermost first,
    /// paired with each file's origin directory
    fn exclusion_files(&self, path: &Path) -> Vec<(PathBuf, PathBuf)> {
        let mut files = vec![
            (self.git_path.join(REPO_EXCLUDE_FILE), PathBuf::new()),
            (self.root.join(EXCLUDE_FILE_NAME), PathBuf::new()),
        ];

        let mut origin = PathBuf::new();
        if let Some(parent) = path.parent() {
            for component in parent.components() {
                origin.push(component);
                files.push((self.root.join(&origin).join(EXCLUDE_FILE_NAME), origin.clone()));
            }
        }

        files
    }

    /// Fetch the parsed rules for one exclusion file, reloading only when the
    /// cache has no fresh entry
    fn rule_set(&self, file: &Path, origin: &Path) -> RuleSet {
        if let Some(rules) = self.rule_sets.get(file) {
            return rules;
        }

        tracing::debug!("loading exclusion file {}", file.display());
        let rules = RuleSet::load(file, origin);
        self.rule_sets.put(file.to_path_buf(), rules.clone());

        rules
    }

    /// Register a callback fired when an exclusion file changes, so dependent
    /// caches (e.g. a status snapshot) can recompute
    pub fn on_rules_changed(&self, listener: impl Fn(&Path) + Send + Sync + 'static) {
        self.rule_sets.on_refresh(listener);
    }

    /// Number of exclusion files currently cached
    pub fn cached_files(&self) -> usize {
        self.rule_sets.len()
    }
}
