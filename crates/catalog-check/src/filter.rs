//! Node selection by include/exclude patterns

use crate::error::{CatalogCheckError, CheckResult};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides which discovered nodes become test cases.
///
/// A name is selected when it satisfies the include matcher and does not
/// satisfy the exclude matcher. Exclusion always wins.
#[derive(Clone)]
pub struct Filter {
    include: Matcher,
    exclude: Option<Matcher>,
}

#[derive(Clone)]
enum Matcher {
    Any,
    Pattern(Regex),
    Predicate(Predicate),
}

impl Matcher {
    fn is_match(&self, name: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Pattern(re) => re.is_match(name),
            Matcher::Predicate(f) => f(name),
        }
    }

    fn compile(pattern: &str) -> CheckResult<Self> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|e| CatalogCheckError::invalid_pattern(pattern, e))
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::Pattern(re) => write!(f, "Pattern({:?})", re.as_str()),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

impl Filter {
    /// Create a filter from an include pattern and an optional exclude pattern
    ///
    /// Patterns are unanchored regular expressions, so `foo` selects every
    /// name containing `foo`.
    pub fn new(include: &str, exclude: Option<&str>) -> CheckResult<Self> {
        Ok(Self {
            include: Matcher::compile(include)?,
            exclude: exclude.map(Matcher::compile).transpose()?,
        })
    }

    /// A filter that selects every name
    pub fn all() -> Self {
        Self {
            include: Matcher::Any,
            exclude: None,
        }
    }

    /// Select only names matching `pattern`
    pub fn include(pattern: &str) -> CheckResult<Self> {
        Self::new(pattern, None)
    }

    /// Select with an arbitrary predicate instead of a pattern
    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            include: Matcher::Predicate(Arc::new(predicate)),
            exclude: None,
        }
    }

    /// Add (or replace) the exclude pattern
    pub fn with_exclude(mut self, pattern: &str) -> CheckResult<Self> {
        self.exclude = Some(Matcher::compile(pattern)?);
        Ok(self)
    }

    /// Check whether `name` is selected by this filter
    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_match(name) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(name),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_everything() {
        let filter = Filter::default();
        assert!(filter.matches("foo"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_include_is_unanchored() {
        let filter = Filter::include("foo").unwrap();
        assert!(filter.matches("foo"));
        assert!(filter.matches("web-foo.example.com"));
        assert!(!filter.matches("default"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = Filter::new(".*", Some("foo")).unwrap();
        assert!(!filter.matches("foo"));
        assert!(filter.matches("default"));
    }

    #[test]
    fn test_with_exclude_on_match_all() {
        let filter = Filter::all().with_exclude("^db").unwrap();
        assert!(filter.matches("web01"));
        assert!(!filter.matches("db01"));
    }

    #[test]
    fn test_invalid_include_pattern() {
        let err = Filter::include("(unclosed").unwrap_err();
        assert!(matches!(err, CatalogCheckError::InvalidPattern { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = Filter::new(".*", Some("[z-a]")).unwrap_err();
        assert!(matches!(
            err,
            CatalogCheckError::InvalidPattern { ref pattern, .. } if pattern == "[z-a]"
        ));
    }

    #[test]
    fn test_predicate_filter() {
        let filter = Filter::from_predicate(|name| name.len() == 3)
            .with_exclude("^b")
            .unwrap();
        assert!(filter.matches("foo"));
        assert!(!filter.matches("bar"));
        assert!(!filter.matches("default"));
    }
}
