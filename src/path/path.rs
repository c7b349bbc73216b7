use crate::error::{Result, StoreError};
use std::fmt;

const WILDCARD: &str = "*";

/// A concrete dotted path into the state tree, e.g. `model.listOfItems`.
///
/// Parsed once from its string form; segments are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a dotted string into its segments.
    ///
    /// `operation` names the caller in the returned error.
    pub fn parse(input: &str, operation: &'static str) -> Result<Self> {
        if input.is_empty() {
            return Err(StoreError::invalid(operation, "path must not be empty"));
        }

        let segments: Vec<String> = input.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StoreError::invalid(
                operation,
                format!("empty segment in path '{}'", input),
            ));
        }

        Ok(Self { segments })
    }

    /// The segments in order, e.g. `["model", "listOfItems"]`.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; at least one.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if the path has no segments. Parsed paths always have one.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `self` begins with all of `prefix`'s segments.
    pub fn starts_with(&self, prefix: &StorePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Split into the parent segments and the final segment.
    pub(crate) fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            None => (&[], ""),
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A subscription filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches only the identical path.
    Exact(StorePath),
    /// `prefix.*`: matches any path strictly below `prefix`, at any depth.
    Prefix(StorePath),
}

impl PathPattern {
    /// Parse a subscription pattern.
    ///
    /// A trailing `*` segment after at least one other segment makes a
    /// prefix wildcard. A lone `*` is an ordinary exact path.
    pub fn parse(input: &str) -> Result<Self> {
        let path = StorePath::parse(input, "subscribe")?;
        let (parents, last) = path.split_last();
        if last == WILDCARD && !parents.is_empty() {
            Ok(PathPattern::Prefix(StorePath {
                segments: parents.to_vec(),
            }))
        } else {
            Ok(PathPattern::Exact(path))
        }
    }

    /// Test a changed path against this pattern.
    ///
    /// Prefix matching compares whole segments, so `a.*` matches `a.b` and
    /// `a.b.c` but neither `a` nor `ab.c`.
    pub fn matches(&self, changed: &StorePath) -> bool {
        match self {
            PathPattern::Exact(path) => path == changed,
            PathPattern::Prefix(prefix) => {
                changed.len() > prefix.len() && changed.starts_with(prefix)
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, PathPattern::Prefix(_))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Exact(path) => write!(f, "{}", path),
            PathPattern::Prefix(prefix) => write!(f, "{}.{}", prefix, WILDCARD),
        }
    }
}
