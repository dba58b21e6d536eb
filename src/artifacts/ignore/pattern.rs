//! One parsed exclusion rule
//!
//! A pattern records the flags gitignore syntax encodes positionally:
//! a leading `!` negates, a trailing unescaped `/` restricts the rule to
//! directories and their contents, a leading `/` anchors the rule to the
//! defining directory. A slash anywhere else in the pattern also anchors it;
//! only slash-free patterns float to any depth below their origin.
//!
//! Matching is always evaluated relative to the repository root using the
//! pattern's own origin directory (the directory containing the exclusion
//! file that defined it).

use crate::artifacts::ignore::glob;
use std::path::{Component, Path, PathBuf};

/// Split a pattern at `/` boundaries, keeping escaped characters (including
/// an escaped slash) inside their segment
fn split_segments(line: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '/' => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
}

/// A single exclusion rule, immutable once parsed
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The line as written, flags stripped
    raw: String,
    /// `raw` split at `/` boundaries
    segments: Vec<String>,
    /// Matches only relative to the origin directory, not at any depth
    anchored: bool,
    /// Matches directories and everything beneath them, never a plain file
    dir_only: bool,
    /// Reverses the verdict of this match
    negated: bool,
    /// Directory containing the defining exclusion file, relative to the
    /// repository root; empty for root-level and repository-wide files
    origin: PathBuf,
}

impl PathPattern {
    /// Parse one exclusion-file line
    ///
    /// Returns None for blank lines, comments, and lines that are empty once
    /// their flags are stripped (malformed rules are skipped, never fatal).
    pub fn parse(line: &str, origin: &Path) -> Option<Self> {
        let mut line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let negated = line.starts_with('!');
        if negated {
            line = &line[1..];
        }

        let dir_only = line.ends_with('/') && !line.ends_with("\\/");
        if dir_only {
            line = &line[..line.len() - 1];
        }

        let mut anchored = line.starts_with('/');
        if anchored {
            line = &line[1..];
        }

        if line.is_empty() {
            return None;
        }

        let segments = split_segments(line);
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }

        // an internal slash pins the rule to its origin directory
        anchored |= segments.len() > 1;

        Some(PathPattern {
            raw: line.to_string(),
            segments,
            anchored,
            dir_only,
            negated,
            origin: origin.to_path_buf(),
        })
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Test a repository-relative path against this rule
    ///
    /// `is_dir` says whether the final component itself names a directory;
    /// ancestors within the path count as directories regardless of what is
    /// currently on disk. Returns the raw verdict: the caller applies the
    /// negation flag.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        let relative = if self.origin.as_os_str().is_empty() {
            path
        } else {
            match path.strip_prefix(&self.origin) {
                Ok(relative) => relative,
                Err(_) => return false,
            }
        };

        let components: Vec<&str> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();

        if components.is_empty() {
            return false;
        }

        if self.anchored {
            self.matches_at(&components, 0, is_dir)
        } else {
            (0..components.len()).any(|start| self.matches_at(&components, start, is_dir))
        }
    }

    /// Match the segment sequence against `components[start..]`
    fn matches_at(&self, components: &[&str], start: usize, is_dir: bool) -> bool {
        if start + self.segments.len() > components.len() {
            return false;
        }

        let all_match = self
            .segments
            .iter()
            .zip(&components[start..])
            .all(|(segment, component)| glob::matches(segment, component));
        if !all_match {
            return false;
        }

        if self.dir_only {
            // the matched prefix must name a directory: either components
            // follow beneath it, or the final component is itself a directory
            start + self.segments.len() < components.len() || is_dir
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pattern(line: &str) -> PathPattern {
        PathPattern::parse(line, Path::new("")).expect("pattern should parse")
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(PathPattern::parse("", Path::new("")).is_none());
        assert!(PathPattern::parse("   ", Path::new("")).is_none());
        assert!(PathPattern::parse("# comment", Path::new("")).is_none());
        assert!(PathPattern::parse("!", Path::new("")).is_none());
        assert!(PathPattern::parse("/", Path::new("")).is_none());
    }

    #[rstest]
    #[case("*.log", "build/trace.log", false, true)]
    #[case("*.log", "trace.log", false, true)]
    #[case("*.log", "trace.log.bak", false, false)]
    #[case("target", "target/debug/app", false, true)]
    #[case("/target", "target/debug/app", false, true)]
    #[case("/target", "nested/target/debug/app", false, false)]
    fn match_anywhere_vs_anchored(
        #[case] line: &str,
        #[case] path: &str,
        #[case] is_dir: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(pattern(line).matches(Path::new(path), is_dir), expected);
    }

    #[test]
    fn directory_only_matches_contents_but_not_plain_file() {
        let rule = pattern("path/");

        assert!(rule.matches(Path::new("path/to/File.java"), false));
        assert!(rule.matches(Path::new("path"), true));
        assert!(!rule.matches(Path::new("path"), false));
    }

    #[test]
    fn slashed_pattern_is_pinned_to_its_origin() {
        let rule = pattern("path/subdir/");

        assert!(!rule.matches(Path::new("some/path/subdir/File.java"), false));
        assert!(rule.matches(Path::new("path/subdir/File.java"), false));
    }

    #[test]
    fn negation_flag_is_reported_not_applied() {
        let rule = PathPattern::parse("!keep.txt", Path::new("")).unwrap();

        assert!(rule.is_negated());
        assert!(rule.matches(Path::new("keep.txt"), false));
    }

    #[test]
    fn origin_scopes_the_rule() {
        let rule = PathPattern::parse("*.tmp", Path::new("sub")).unwrap();

        assert!(rule.matches(Path::new("sub/cache.tmp"), false));
        assert!(rule.matches(Path::new("sub/deep/cache.tmp"), false));
        assert!(!rule.matches(Path::new("other/cache.tmp"), false));
        assert!(!rule.matches(Path::new("cache.tmp"), false));
    }

    #[test]
    fn escaped_trailing_slash_is_not_a_directory_flag() {
        let rule = PathPattern::parse("name\\/", Path::new("")).unwrap();

        // the rule stays a single (escaped) segment rather than a directory rule
        assert_eq!(rule.raw(), "name\\/");
    }
}
