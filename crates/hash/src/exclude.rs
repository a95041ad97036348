//! Name patterns for cache artifacts that never belong in a signed tree

/// Patterns excluded when nothing else is configured.
///
/// `pycache` matches interpreter bytecode caches such as `__pycache__`.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["pycache"];

/// Substring patterns matched against individual path components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl ExclusionSet {
    /// Build a set from explicit patterns. Empty patterns are dropped, since
    /// every name contains the empty string.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns: Vec<String> = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        patterns.sort();
        patterns.dedup();
        Self { patterns }
    }

    /// A set that excludes nothing
    #[must_use]
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether a single path component should be skipped
    #[must_use]
    pub fn is_excluded(&self, component: &str) -> bool {
        self.patterns.iter().any(|p| component.contains(p.as_str()))
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDE_PATTERNS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_bytecode_cache() {
        let set = ExclusionSet::default();
        assert!(set.is_excluded("__pycache__"));
        assert!(!set.is_excluded("src"));
        assert!(!set.is_excluded("cache"));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let set = ExclusionSet::empty();
        assert!(!set.is_excluded("__pycache__"));
    }

    #[test]
    fn test_empty_patterns_are_ignored() {
        let set = ExclusionSet::new(["", "target"]);
        assert_eq!(set.patterns(), &["target".to_string()]);
        assert!(!set.is_excluded("src"));
        assert!(set.is_excluded("target"));
    }
}
