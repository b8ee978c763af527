//! Include/exclude filters for watched paths
//!
//! A watch holds an ordered [`FilterChain`]. A path is skipped when any
//! filter in the chain excludes it.

use crate::pattern::matches;
use std::fmt;
use std::path::Path;
use tracing::trace;

/// Persisted behaviour tag of a filter
///
/// Stored alongside every filter record. Only two outcomes exist: exclusion
/// on match, or exclusion unless matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBehaviour {
    /// Matching paths are excluded
    Ignore,
    /// Only matching paths are kept
    Include,
}

impl FilterBehaviour {
    /// Numeric tag used by the binary formats
    pub fn tag(self) -> u32 {
        match self {
            Self::Ignore => 0,
            Self::Include => 1,
        }
    }
}

/// A single filter over candidate paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exclude when the last path component matches any pattern
    ExcludeName(Vec<String>),
    /// Exclude when the full path matches any pattern
    ExcludePath(Vec<String>),
    /// Exclude when the full path matches none of the patterns
    IncludeOnly(Vec<String>),
}

impl Filter {
    /// Build an exclude-by-name filter
    pub fn exclude_name<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExcludeName(patterns.into_iter().map(Into::into).collect())
    }

    /// Build an exclude-by-full-path filter
    pub fn exclude_path<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExcludePath(patterns.into_iter().map(Into::into).collect())
    }

    /// Build an include-only filter
    pub fn include_only<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::IncludeOnly(patterns.into_iter().map(Into::into).collect())
    }

    /// Behaviour tag for this variant
    pub fn behaviour(&self) -> FilterBehaviour {
        match self {
            Self::ExcludeName(_) | Self::ExcludePath(_) => FilterBehaviour::Ignore,
            Self::IncludeOnly(_) => FilterBehaviour::Include,
        }
    }

    /// Patterns in declaration order
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::ExcludeName(p) | Self::ExcludePath(p) | Self::IncludeOnly(p) => p,
        }
    }

    /// Append a pattern
    pub fn push_pattern(&mut self, pattern: impl Into<String>) {
        self.patterns_mut().push(pattern.into());
    }

    /// Remove every occurrence of a pattern, returning whether any was removed
    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        let patterns = self.patterns_mut();
        let before = patterns.len();
        patterns.retain(|p| p != pattern);
        patterns.len() != before
    }

    fn patterns_mut(&mut self) -> &mut Vec<String> {
        match self {
            Self::ExcludeName(p) | Self::ExcludePath(p) | Self::IncludeOnly(p) => p,
        }
    }

    /// Decide whether `path` should be skipped
    pub fn should_exclude(&self, path: &Path) -> bool {
        match self {
            Self::ExcludeName(patterns) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                patterns.iter().any(|p| matches(&name, p))
            }
            Self::ExcludePath(patterns) => {
                let full = path.to_string_lossy();
                patterns.iter().any(|p| matches(&full, p))
            }
            Self::IncludeOnly(patterns) => {
                let full = path.to_string_lossy();
                !patterns.iter().any(|p| matches(&full, p))
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExcludeName(_) => "exclude-name",
            Self::ExcludePath(_) => "exclude",
            Self::IncludeOnly(_) => "include",
        };
        write!(f, "{}({})", label, self.patterns().join(";"))
    }
}

/// Ordered list of filters applied to every candidate path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    /// Create an empty chain (excludes nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter to the end of the chain
    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Filters in order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Decide whether `path` is excluded by any filter
    ///
    /// Every filter is evaluated so each exclusion shows up in trace logs.
    pub fn should_exclude(&self, path: &Path) -> bool {
        let mut excluded = false;
        for filter in &self.filters {
            if filter.should_exclude(path) {
                trace!("{} excluded by {}", path.display(), filter);
                excluded = true;
            }
        }
        excluded
    }
}

impl From<Vec<Filter>> for FilterChain {
    fn from(filters: Vec<Filter>) -> Self {
        Self { filters }
    }
}

impl FromIterator<Filter> for FilterChain {
    fn from_iter<T: IntoIterator<Item = Filter>>(iter: T) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FilterChain {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn under(root: &Path, name: &str) -> PathBuf {
        root.join(name)
    }

    #[test]
    fn test_exclude_name_uses_last_component() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let filter = Filter::exclude_name([".*", "testfile"]);

        assert!(filter.should_exclude(&under(root, "testfile")));
        assert!(filter.should_exclude(&under(root, ".testfile")));
        assert!(filter.should_exclude(&under(root, "... ")));

        assert!(!filter.should_exclude(&under(root, "false")));
        assert!(!filter.should_exclude(&under(root, "fa.lse")));
        assert!(!filter.should_exclude(&under(root, "testfile2")));
    }

    #[test]
    fn test_exclude_name_ignores_parent_dirs() {
        let filter = Filter::exclude_name([".*"]);
        assert!(!filter.should_exclude(Path::new("/home/user/.config/app.toml")));
        assert!(filter.should_exclude(Path::new("/home/user/project/.gitignore")));
    }

    #[test]
    fn test_exclude_path_matches_full_path() {
        let filter = Filter::exclude_path(["*.txt", "*.ini"]);
        assert!(filter.should_exclude(Path::new("/data/in/hello.txt")));
        assert!(filter.should_exclude(Path::new("/data/in/test.ini")));
        assert!(!filter.should_exclude(Path::new("/data/in/othertest.bork")));
        assert!(!filter.should_exclude(Path::new("/data/in/test")));
    }

    #[test]
    fn test_include_only_is_inverted() {
        let filter = Filter::include_only(["*\\out\\*", "*testfile"]);
        assert!(!filter.should_exclude(Path::new("C:\\data\\out\\report.doc")));
        assert!(!filter.should_exclude(Path::new("/data/in/testfile")));
        assert!(filter.should_exclude(Path::new("/data/in/notes.doc")));
    }

    #[test]
    fn test_behaviour_tags() {
        assert_eq!(Filter::exclude_name(["a"]).behaviour(), FilterBehaviour::Ignore);
        assert_eq!(Filter::exclude_path(["a"]).behaviour(), FilterBehaviour::Ignore);
        assert_eq!(Filter::include_only(["a"]).behaviour(), FilterBehaviour::Include);
        assert_eq!(FilterBehaviour::Include.tag(), 1);
    }

    #[test]
    fn test_pattern_membership() {
        let mut filter = Filter::exclude_path(["*.tmp"]);
        filter.push_pattern("*.bak");
        assert_eq!(filter.patterns(), ["*.tmp", "*.bak"]);

        assert!(filter.remove_pattern("*.tmp"));
        assert!(!filter.remove_pattern("*.tmp"));
        assert_eq!(filter.patterns(), ["*.bak"]);
    }

    #[test]
    fn test_chain_excludes_if_any_filter_excludes() {
        let chain: FilterChain = vec![
            Filter::exclude_path(["*.log"]),
            Filter::include_only(["*/src/*"]),
        ]
        .into();

        assert!(!chain.should_exclude(Path::new("/repo/src/main.rs")));
        assert!(chain.should_exclude(Path::new("/repo/src/debug.log")));
        assert!(chain.should_exclude(Path::new("/repo/docs/readme.md")));
    }

    #[test]
    fn test_chain_order_does_not_change_outcome() {
        let a = Filter::exclude_name(["*.tmp"]);
        let b = Filter::include_only(["*keep*"]);
        let forward: FilterChain = vec![a.clone(), b.clone()].into();
        let backward: FilterChain = vec![b, a].into();

        for path in ["/x/keep.tmp", "/x/keep.rs", "/x/other.rs"] {
            assert_eq!(
                forward.should_exclude(Path::new(path)),
                backward.should_exclude(Path::new(path))
            );
        }
    }

    #[test]
    fn test_empty_chain_excludes_nothing() {
        let chain = FilterChain::new();
        assert!(!chain.should_exclude(Path::new("/anything")));
    }

    #[test]
    fn test_chain_equality_is_elementwise() {
        let a: FilterChain = vec![Filter::exclude_path(["*.a", "*.b"])].into();
        let b: FilterChain = vec![Filter::exclude_path(["*.a", "*.b"])].into();
        let reordered: FilterChain = vec![Filter::exclude_path(["*.b", "*.a"])].into();
        let other_kind: FilterChain = vec![Filter::exclude_name(["*.a", "*.b"])].into();

        assert_eq!(a, b);
        assert_ne!(a, reordered);
        assert_ne!(a, other_kind);
    }
}
