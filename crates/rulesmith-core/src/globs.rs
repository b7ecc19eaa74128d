//! Compiled glob matching over forward-slash relative paths.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{CoreError, Result};

/// A compiled set of glob patterns.
#[derive(Clone, Debug)]
pub struct GlobMatcher {
    patterns: Vec<String>,
    set: GlobSet,
}

impl GlobMatcher {
    /// Compile `patterns`. An empty pattern list matches nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|source| CoreError::Glob {
                pattern: pattern.to_owned(),
                source,
            })?;
            let _ = builder.add(glob);
        }
        let set = builder.build().map_err(|source| CoreError::Glob {
            pattern: patterns
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;
        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_owned()).collect(),
            set,
        })
    }

    /// Source patterns, in declaration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether `path` matches any pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    /// Whether any of `paths` matches.
    pub fn matches_any<'a, I>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths.into_iter().any(|p| self.is_match(p))
    }

    /// Number of `paths` that match.
    pub fn count_matches<'a, I>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths.into_iter().filter(|p| self.is_match(p)).count()
    }
}
