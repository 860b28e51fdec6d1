//! Hierarchical log categories
//!
//! A category is a root-to-leaf path such as `["app", "auth", "oauth"]`.
//! Registry entries are keyed by category prefixes; the empty path is the
//! root and matches every record.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category {
    segments: Vec<String>,
}

impl Category {
    /// Build a category from path segments. Empty segments are skipped.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::<String>::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// The root category (empty path)
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dot-joined path (`"app.auth"`)
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').map(str::trim))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Derive a sub-category one level below this one
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        let segment = segment.into();
        if !segment.is_empty() {
            segments.push(segment);
        }
        Self { segments }
    }

    /// Whether `self` is `other` or one of its ancestors
    pub fn is_prefix_of(&self, other: &Category) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Iterate from this category up to the root, longest path first
    pub fn ancestors(&self) -> impl Iterator<Item = &[String]> {
        (0..=self.segments.len()).rev().map(move |n| &self.segments[..n])
    }

    /// Dot-joined form used for labels, tags and rate-limit keys
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

impl From<&str> for Category {
    fn from(dotted: &str) -> Self {
        Category::parse(dotted)
    }
}

impl From<String> for Category {
    fn from(dotted: String) -> Self {
        Category::parse(&dotted)
    }
}

impl From<Vec<String>> for Category {
    fn from(segments: Vec<String>) -> Self {
        Category::new(segments)
    }
}

impl From<&[&str]> for Category {
    fn from(segments: &[&str]) -> Self {
        Category::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Category {
    fn from(segments: [&str; N]) -> Self {
        Category::new(segments)
    }
}
