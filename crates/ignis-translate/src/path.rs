//! Domain-tagged paths for addressing within configuration trees
//!
//! Provides [`Path`] for hierarchical addressing of values on either side of a
//! translation, and [`Domain`] for telling the two sides apart.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Which tree a path lives in
///
/// The tag names the addressing convention of that tree (for example `yaml`
/// for a source document with snake_case keys and `json` for a generated
/// document with camelCase keys). Paths in different domains are never
/// compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Domain(&'static str);

impl Domain {
    /// Create a domain from its tag
    #[inline]
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    /// Domain tag
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for Domain {
    fn from(tag: &'static str) -> Self {
        Self(tag)
    }
}

/// One step of a path: a named field or a sequence position
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Segment {
    /// Record field or map key
    Field(String),
    /// Position within an ordered sequence
    Index(usize),
}

impl Segment {
    /// Field name, if this is a field segment
    #[inline]
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Position, if this is an index segment
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Field(_) => None,
            Self::Index(i) => Some(*i),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for Segment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for Segment {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location inside one of the two trees
///
/// Paths are values: every operation that "changes" a path returns a new one.
///
/// # Examples
/// - `yaml:$.storage.filesystems.0.with_mount_unit`
/// - `json:$.systemd.units.3.contents`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Path {
    domain: Domain,
    segments: Vec<Segment>,
}

impl Path {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(domain: impl Into<Domain>, segments: Vec<Segment>) -> Self {
        Self {
            domain: domain.into(),
            segments,
        }
    }

    /// Root of a domain
    #[inline]
    #[must_use]
    pub fn root(domain: impl Into<Domain>) -> Self {
        Self::new(domain, Vec::new())
    }

    /// Domain this path belongs to
    #[inline]
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if path is the domain root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get parent path (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self::new(self.domain, init.to_vec()))
    }

    /// Get last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn append(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(self.domain, segments)
    }

    /// Append several segments, returning new path
    #[must_use]
    pub fn join(&self, tail: &[Segment]) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(tail);
        Self::new(self.domain, segments)
    }

    /// Prepend a segment, returning new path
    #[must_use]
    pub fn prepend(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment.into());
        segments.extend_from_slice(&self.segments);
        Self::new(self.domain, segments)
    }

    /// Check if this path is a prefix of another in the same domain
    ///
    /// A path is a prefix of itself.
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.domain == other.domain && other.segments.starts_with(&self.segments)
    }

    /// Segments of `self` below `prefix`, if `prefix` is a prefix of `self`
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<&[Segment]> {
        if prefix.is_prefix_of(self) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Build a [`Path`] from a domain and a list of segments
///
/// Each segment is converted with `Segment::from`, so string slices become
/// field segments and `usize` values become index segments.
///
/// ```
/// use ignis_translate::{path, Domain, Segment};
///
/// const YAML: Domain = Domain::new("yaml");
/// let p = path!(YAML, "storage", "filesystems", 0_usize, "path");
/// assert_eq!(p.to_string(), "$.storage.filesystems.0.path");
/// assert_eq!(p.segments()[2], Segment::Index(0));
/// ```
#[macro_export]
macro_rules! path {
    ($domain:expr $(, $segment:expr)* $(,)?) => {
        $crate::Path::new($domain, vec![$($crate::Segment::from($segment)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: Domain = Domain::new("yaml");
    const JSON: Domain = Domain::new("json");

    #[test]
    fn path_root() {
        let root = Path::root(YAML);
        assert!(root.is_root());
        assert_eq!(root.len(), 0);
        assert_eq!(root.to_string(), "$");
        assert!(root.parent().is_none());
    }

    #[test]
    fn path_append_is_new_value() {
        let base = path!(YAML, "storage");
        let child = base.append("files").append(2_usize);
        assert_eq!(base.len(), 1);
        assert_eq!(
            child.segments(),
            &[
                Segment::from("storage"),
                Segment::from("files"),
                Segment::Index(2)
            ]
        );
    }

    #[test]
    fn path_prepend() {
        let p = path!(JSON, "contents").prepend(0_usize).prepend("files");
        assert_eq!(p.to_string(), "$.files.0.contents");
    }

    #[test]
    fn path_join() {
        let p = path!(JSON, "a").join(&[Segment::from("b"), Segment::Index(1)]);
        assert_eq!(p.to_string(), "$.a.b.1");
    }

    #[test]
    fn path_parent_and_last() {
        let p = path!(YAML, "a", "b");
        assert_eq!(p.parent(), Some(path!(YAML, "a")));
        assert_eq!(p.last(), Some(&Segment::from("b")));
    }

    #[test]
    fn path_prefix_is_domain_aware() {
        let short = path!(YAML, "a");
        let long = path!(YAML, "a", "b");
        assert!(short.is_prefix_of(&long));
        assert!(short.is_prefix_of(&short));
        assert!(!long.is_prefix_of(&short));
        assert!(!path!(JSON, "a").is_prefix_of(&long));
    }

    #[test]
    fn path_strip_prefix() {
        let long = path!(JSON, "units", 3_usize, "contents");
        let rest = long.strip_prefix(&path!(JSON, "units")).unwrap();
        assert_eq!(rest, &[Segment::Index(3), Segment::from("contents")]);
        assert!(long.strip_prefix(&path!(JSON, "files")).is_none());
    }

    #[test]
    fn paths_equal_structurally() {
        assert_eq!(path!(YAML, "a", 0_usize), path!(YAML, "a", 0_usize));
        assert_ne!(path!(YAML, "a"), path!(JSON, "a"));
        assert_ne!(path!(YAML, "0"), path!(YAML, 0_usize));
    }

    #[test]
    fn segment_accessors() {
        assert_eq!(Segment::from("x").as_field(), Some("x"));
        assert_eq!(Segment::Index(4).as_index(), Some(4));
        assert!(Segment::Index(4).as_field().is_none());
    }

    #[test]
    fn path_serializes_segments_untagged() {
        let json = serde_json::to_value(path!(YAML, "a", 1_usize)).unwrap();
        assert_eq!(json, serde_json::json!({"domain": "yaml", "segments": ["a", 1]}));
    }
}
