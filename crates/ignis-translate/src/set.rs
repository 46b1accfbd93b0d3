//! Translation sets: provenance entries and their merge/prefix algebra
//!
//! Provides [`TranslationSet`], a collection of [`Translation`] entries bound to
//! one (source domain, destination domain) pair, keyed by destination path.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::TranslateError;
use crate::path::{Domain, Path, Segment};

/// Provenance entry: `to` was produced from, or is explained by, `from`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Translation {
    /// Location in the source tree
    pub from: Path,
    /// Location in the destination tree
    pub to: Path,
}

impl Translation {
    /// Create new translation entry
    #[inline]
    #[must_use]
    pub fn new(from: Path, to: Path) -> Self {
        Self { from, to }
    }
}

impl Display for Translation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.from.domain(),
            self.from,
            self.to.domain(),
            self.to
        )
    }
}

/// Result of resolving a destination path back to the source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// The destination path itself has a recorded source
    Exact(Path),
    /// An ancestor of the destination path has a recorded source; the
    /// unmatched suffix was carried over unchanged
    Approximate(Path),
    /// Nothing recorded for the path or any ancestor; the destination path
    /// is returned as-is
    Unresolved(Path),
}

impl Provenance {
    /// Best available path, in whichever domain it resolved to
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Exact(p) | Self::Approximate(p) | Self::Unresolved(p) => p,
        }
    }

    /// Take the best available path
    #[inline]
    #[must_use]
    pub fn into_path(self) -> Path {
        match self {
            Self::Exact(p) | Self::Approximate(p) | Self::Unresolved(p) => p,
        }
    }

    /// Check if the path resolved into the source tree
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved(_))
    }
}

/// Collection of provenance entries for one (source, destination) domain pair
///
/// # Invariants
/// - Every entry's `from` is in `from_domain` and `to` is in `to_domain`
/// - At most one entry per destination path; a second claim is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSet {
    from_domain: Domain,
    to_domain: Domain,
    entries: BTreeMap<Vec<Segment>, Translation>,
    /// Destination roots of subtrees attributed wholesale to one source
    common_roots: BTreeSet<Vec<Segment>>,
}

impl TranslationSet {
    /// Create new empty set
    #[inline]
    #[must_use]
    pub fn new(from_domain: impl Into<Domain>, to_domain: impl Into<Domain>) -> Self {
        Self {
            from_domain: from_domain.into(),
            to_domain: to_domain.into(),
            entries: BTreeMap::new(),
            common_roots: BTreeSet::new(),
        }
    }

    /// Set holding only the root-to-root entry
    pub(crate) fn rooted(from_domain: Domain, to_domain: Domain) -> Self {
        let mut ts = Self::new(from_domain, to_domain);
        let (from, to) = (Path::root(from_domain), Path::root(to_domain));
        ts.entries.insert(Vec::new(), Translation::new(from, to));
        ts
    }

    /// Source domain
    #[inline]
    #[must_use]
    pub fn from_domain(&self) -> Domain {
        self.from_domain
    }

    /// Destination domain
    #[inline]
    #[must_use]
    pub fn to_domain(&self) -> Domain {
        self.to_domain
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if set has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries, ordered by destination path
    pub fn iter(&self) -> impl Iterator<Item = &Translation> {
        self.entries.values()
    }

    /// Entry recorded for exactly this destination path
    #[must_use]
    pub fn get(&self, to: &Path) -> Option<&Translation> {
        if to.domain() != self.to_domain {
            return None;
        }
        self.entries.get(to.segments())
    }

    /// Check if the destination root itself has an entry
    #[inline]
    #[must_use]
    pub(crate) fn has_root(&self) -> bool {
        let root: &[Segment] = &[];
        self.entries.contains_key(root)
    }

    /// Record that `to` was derived from `from`
    ///
    /// # Errors
    /// - [`TranslateError::DomainMismatch`] if either path is on the wrong side
    /// - [`TranslateError::Conflict`] if `to` already has an entry
    pub fn add_translation(&mut self, from: Path, to: Path) -> Result<(), TranslateError> {
        self.check_domains(&from, &to)?;
        self.check_free(&from, &to)?;
        self.entries
            .insert(to.segments().to_vec(), Translation::new(from, to));
        Ok(())
    }

    /// Record identity translations for fields copied unchanged under the same name
    ///
    /// Each name maps `$.name` on the source side to `$.name` on the
    /// destination side, relative to the root of this set.
    ///
    /// # Errors
    /// Returns [`TranslateError::Conflict`] if any name is already mapped
    pub fn add_identity(&mut self, names: &[&str]) -> Result<(), TranslateError> {
        for name in names {
            let from = Path::root(self.from_domain).append(*name);
            let to = Path::root(self.to_domain).append(*name);
            self.add_translation(from, to)?;
        }
        Ok(())
    }

    /// Attribute a whole synthesized destination subtree to one source path
    ///
    /// Records an entry from `from` for `to` and for every present node of
    /// `value` below it, addressed by its serialized field names. Lookups of
    /// any path inside the subtree resolve to `from` itself.
    ///
    /// # Errors
    /// - [`TranslateError::Subtree`] if `value` cannot be serialized
    /// - [`TranslateError::Conflict`] if any node of the subtree is already mapped
    pub fn add_from_common_source<V: Serialize>(
        &mut self,
        from: Path,
        to: Path,
        value: &V,
    ) -> Result<(), TranslateError> {
        self.check_domains(&from, &to)?;
        let tree = serde_json::to_value(value)?;
        let mut relative = Vec::new();
        collect_nodes(&tree, &mut Vec::new(), &mut relative, false);
        if tree.is_null() {
            // the subtree root is claimed even when nothing below it is present
            relative.push(Vec::new());
        }

        let targets: Vec<Path> = relative.iter().map(|rel| to.join(rel)).collect();
        for target in &targets {
            self.check_free(&from, target)?;
        }
        for target in targets {
            self.entries.insert(
                target.segments().to_vec(),
                Translation::new(from.clone(), target),
            );
        }
        self.common_roots.insert(to.segments().to_vec());
        Ok(())
    }

    /// New set with `segment` prepended to both sides of every entry
    #[must_use]
    pub fn prefix(&self, segment: impl Into<Segment>) -> Self {
        let segment = segment.into();
        self.prefix_with(segment.clone(), segment)
    }

    /// New set with `from_segment` prepended on the source side and
    /// `to_segment` on the destination side
    #[must_use]
    pub fn prefix_with(
        &self,
        from_segment: impl Into<Segment>,
        to_segment: impl Into<Segment>,
    ) -> Self {
        let from_segment = from_segment.into();
        let to_segment = to_segment.into();
        let entries = self
            .entries
            .values()
            .map(|t| {
                let to = t.to.prepend(to_segment.clone());
                (
                    to.segments().to_vec(),
                    Translation::new(t.from.prepend(from_segment.clone()), to),
                )
            })
            .collect();
        let common_roots = self
            .common_roots
            .iter()
            .map(|root| {
                let mut prefixed = Vec::with_capacity(root.len() + 1);
                prefixed.push(to_segment.clone());
                prefixed.extend_from_slice(root);
                prefixed
            })
            .collect();
        Self {
            from_domain: self.from_domain,
            to_domain: self.to_domain,
            entries,
            common_roots,
        }
    }

    /// Union with another set, no path rewriting
    ///
    /// Either every entry of `other` is added or none is.
    ///
    /// # Errors
    /// - [`TranslateError::DomainMismatch`] if `other` is bound to different domains
    /// - [`TranslateError::Conflict`] if both sets map the same destination path
    pub fn merge(&mut self, other: Self) -> Result<(), TranslateError> {
        if other.from_domain != self.from_domain {
            return Err(TranslateError::DomainMismatch {
                path: "$".to_string(),
                expected: self.from_domain,
                found: other.from_domain,
            });
        }
        if other.to_domain != self.to_domain {
            return Err(TranslateError::DomainMismatch {
                path: "$".to_string(),
                expected: self.to_domain,
                found: other.to_domain,
            });
        }
        for t in other.entries.values() {
            self.check_domains(&t.from, &t.to)?;
            self.check_free(&t.from, &t.to)?;
        }
        tracing::trace!(
            incoming = other.entries.len(),
            existing = self.entries.len(),
            "merging translation sets"
        );
        self.entries.extend(other.entries);
        self.common_roots.extend(other.common_roots);
        Ok(())
    }

    /// Merge `other` after prefixing both of its sides with `segment`
    ///
    /// # Errors
    /// Same as [`merge`](Self::merge)
    pub fn merge_p(&mut self, segment: impl Into<Segment>, other: &Self) -> Result<(), TranslateError> {
        self.merge(other.prefix(segment))
    }

    /// Merge `other` after prefixing its source side with `from_segment` and
    /// its destination side with `to_segment`
    ///
    /// # Errors
    /// Same as [`merge`](Self::merge)
    pub fn merge_with_prefix(
        &mut self,
        from_segment: impl Into<Segment>,
        to_segment: impl Into<Segment>,
        other: &Self,
    ) -> Result<(), TranslateError> {
        self.merge(other.prefix_with(from_segment, to_segment))
    }

    /// Resolve a destination path to its best-matching source path
    ///
    /// Finds the longest recorded destination prefix of `to`, substitutes
    /// its source path, and appends the unmatched suffix. Inside a subtree
    /// attributed by [`add_from_common_source`](Self::add_from_common_source)
    /// the suffix is dropped. A path with no recorded ancestor comes back
    /// unchanged as [`Provenance::Unresolved`].
    #[must_use]
    pub fn lookup(&self, to: &Path) -> Provenance {
        if to.domain() != self.to_domain {
            tracing::warn!(
                path = %to,
                domain = %to.domain(),
                expected = %self.to_domain,
                "provenance lookup in wrong domain"
            );
            return Provenance::Unresolved(to.clone());
        }

        let segments = to.segments();
        for len in (0..=segments.len()).rev() {
            let Some(t) = self.entries.get(&segments[..len]) else {
                continue;
            };
            if len == segments.len() {
                return Provenance::Exact(t.from.clone());
            }
            if self.in_common_subtree(&segments[..len]) {
                return Provenance::Approximate(t.from.clone());
            }
            return Provenance::Approximate(t.from.join(&segments[len..]));
        }

        tracing::warn!(path = %to, "no provenance recorded for destination path");
        Provenance::Unresolved(to.clone())
    }

    /// Destination leaves of `value` with no recorded provenance
    ///
    /// `value` is addressed by its serialized field names from the root of
    /// the destination domain. Absent (null) values are skipped.
    ///
    /// # Errors
    /// Returns [`TranslateError::Subtree`] if `value` cannot be serialized
    pub fn uncovered<V: Serialize>(&self, value: &V) -> Result<Vec<Path>, TranslateError> {
        let tree = serde_json::to_value(value)?;
        let mut leaves = Vec::new();
        collect_nodes(&tree, &mut Vec::new(), &mut leaves, true);
        Ok(leaves
            .into_iter()
            .filter(|leaf| {
                !self.entries.contains_key(leaf.as_slice()) && !self.in_common_subtree(leaf)
            })
            .map(|leaf| Path::new(self.to_domain, leaf))
            .collect())
    }

    fn in_common_subtree(&self, segments: &[Segment]) -> bool {
        self.common_roots
            .iter()
            .any(|root| segments.starts_with(root))
    }

    fn check_domains(&self, from: &Path, to: &Path) -> Result<(), TranslateError> {
        if from.domain() != self.from_domain {
            return Err(TranslateError::DomainMismatch {
                path: from.to_string(),
                expected: self.from_domain,
                found: from.domain(),
            });
        }
        if to.domain() != self.to_domain {
            return Err(TranslateError::DomainMismatch {
                path: to.to_string(),
                expected: self.to_domain,
                found: to.domain(),
            });
        }
        Ok(())
    }

    fn check_free(&self, from: &Path, to: &Path) -> Result<(), TranslateError> {
        match self.entries.get(to.segments()) {
            Some(existing) => Err(TranslateError::Conflict {
                to: format!("{}:{}", to.domain(), to),
                existing: format!("{}:{}", existing.from.domain(), existing.from),
                incoming: format!("{}:{}", from.domain(), from),
            }),
            None => Ok(()),
        }
    }
}

impl Display for TranslationSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "from {} to {}", self.from_domain, self.to_domain)?;
        for t in self.entries.values() {
            writeln!(f, "  {t}")?;
        }
        Ok(())
    }
}

impl Serialize for TranslationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let translations: Vec<&Translation> = self.entries.values().collect();
        let mut state = serializer.serialize_struct("TranslationSet", 3)?;
        state.serialize_field("from_domain", &self.from_domain)?;
        state.serialize_field("to_domain", &self.to_domain)?;
        state.serialize_field("translations", &translations)?;
        state.end()
    }
}

/// Collect relative paths of present nodes in a serialized tree
///
/// With `leaves_only` unset, containers are reported too (including the
/// root, as the empty path).
fn collect_nodes(
    value: &serde_json::Value,
    prefix: &mut Vec<Segment>,
    out: &mut Vec<Vec<Segment>>,
    leaves_only: bool,
) {
    use serde_json::Value;

    match value {
        Value::Null => {}
        Value::Object(map) => {
            if !leaves_only {
                out.push(prefix.clone());
            }
            for (key, child) in map {
                prefix.push(Segment::Field(key.clone()));
                collect_nodes(child, prefix, out, leaves_only);
                prefix.pop();
            }
        }
        Value::Array(items) => {
            if !leaves_only {
                out.push(prefix.clone());
            }
            for (i, child) in items.iter().enumerate() {
                prefix.push(Segment::Index(i));
                collect_nodes(child, prefix, out, leaves_only);
                prefix.pop();
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => out.push(prefix.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    const YAML: Domain = Domain::new("yaml");
    const JSON: Domain = Domain::new("json");

    fn set() -> TranslationSet {
        TranslationSet::new(YAML, JSON)
    }

    #[test]
    fn identity_maps_same_names() {
        let mut ts = set();
        ts.add_identity(&["path", "mode"]).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(
            ts.lookup(&path!(JSON, "mode")),
            Provenance::Exact(path!(YAML, "mode"))
        );
    }

    #[test]
    fn add_translation_rejects_wrong_domain() {
        let mut ts = set();
        let err = ts
            .add_translation(path!(JSON, "a"), path!(JSON, "a"))
            .unwrap_err();
        assert!(matches!(err, TranslateError::DomainMismatch { .. }));
        assert!(ts.is_empty());
    }

    #[test]
    fn add_translation_rejects_second_claim() {
        let mut ts = set();
        ts.add_translation(path!(YAML, "inline"), path!(JSON, "source"))
            .unwrap();
        let err = ts
            .add_translation(path!(YAML, "source"), path!(JSON, "source"))
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            ts.get(&path!(JSON, "source")).unwrap().from,
            path!(YAML, "inline")
        );
    }

    #[test]
    fn prefix_applies_to_both_sides() {
        let mut ts = set();
        ts.add_identity(&["name"]).unwrap();
        let prefixed = ts.prefix(2_usize).prefix("users");
        assert_eq!(
            prefixed.lookup(&path!(JSON, "users", 2_usize, "name")),
            Provenance::Exact(path!(YAML, "users", 2_usize, "name"))
        );
        // original untouched
        assert!(ts.get(&path!(JSON, "name")).is_some());
    }

    #[test]
    fn prefix_with_uses_distinct_segments() {
        let mut ts = set();
        ts.add_identity(&["ro"]).unwrap();
        let prefixed = ts.prefix_with("mount_options", "mountOptions");
        assert_eq!(
            prefixed.lookup(&path!(JSON, "mountOptions", "ro")),
            Provenance::Exact(path!(YAML, "mount_options", "ro"))
        );
    }

    #[test]
    fn merge_rejects_overlap_atomically() {
        let mut a = set();
        a.add_identity(&["x"]).unwrap();
        let mut b = set();
        b.add_identity(&["y", "x"]).unwrap();

        let err = a.merge(b).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(a.len(), 1);
        assert!(a.get(&path!(JSON, "y")).is_none());
    }

    #[test]
    fn merge_rejects_other_domains() {
        let mut a = set();
        let mut b = TranslationSet::new(JSON, YAML);
        b.add_identity(&["x"]).unwrap();
        assert!(matches!(
            a.merge(b),
            Err(TranslateError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn merge_rejects_empty_set_of_other_domains() {
        let mut a = set();
        assert!(matches!(
            a.merge(TranslationSet::new(JSON, YAML)),
            Err(TranslateError::DomainMismatch { .. })
        ));
        assert!(a.merge(TranslationSet::new(YAML, "toml")).is_err());
        assert!(a.merge(set()).is_ok());
    }

    #[test]
    fn merge_p_roots_child_set() {
        let mut child = set();
        child.add_identity(&["id"]).unwrap();
        let mut parent = set();
        parent.merge_p("user", &child).unwrap();
        assert_eq!(
            parent.lookup(&path!(JSON, "user", "id")),
            Provenance::Exact(path!(YAML, "user", "id"))
        );
    }

    #[test]
    fn lookup_appends_unmatched_suffix() {
        let mut ts = set();
        ts.add_translation(path!(YAML, "storage", "disks"), path!(JSON, "storage", "disks"))
            .unwrap();
        assert_eq!(
            ts.lookup(&path!(JSON, "storage", "disks", 1_usize, "device")),
            Provenance::Approximate(path!(YAML, "storage", "disks", 1_usize, "device"))
        );
    }

    #[test]
    fn lookup_miss_returns_destination_path() {
        let ts = set();
        let p = path!(JSON, "systemd", "units");
        let resolved = ts.lookup(&p);
        assert!(!resolved.is_resolved());
        assert_eq!(resolved.into_path(), p);
    }

    #[test]
    fn lookup_in_source_domain_is_unresolved() {
        let mut ts = set();
        ts.add_identity(&["a"]).unwrap();
        assert_eq!(
            ts.lookup(&path!(YAML, "a")),
            Provenance::Unresolved(path!(YAML, "a"))
        );
    }

    #[test]
    fn common_source_covers_subtree() {
        let mut ts = set();
        let from = path!(YAML, "storage", "filesystems", 0_usize, "with_mount_unit");
        let to = path!(JSON, "systemd", "units", 0_usize);
        let unit = json!({"name": "var.mount", "enabled": true, "dropins": [{"name": "a"}]});
        ts.add_from_common_source(from.clone(), to.clone(), &unit)
            .unwrap();

        // root, name, enabled, dropins, dropins.0, dropins.0.name
        assert_eq!(ts.len(), 6);
        assert_eq!(ts.lookup(&to), Provenance::Exact(from.clone()));
        assert_eq!(
            ts.lookup(&to.append("dropins").append(0_usize).append("name")),
            Provenance::Exact(from.clone())
        );
        assert_eq!(
            ts.lookup(&to.append("contents")),
            Provenance::Approximate(from)
        );
    }

    #[test]
    fn common_source_skips_absent_fields() {
        let mut ts = set();
        let unit = json!({"name": "x", "contents": null});
        ts.add_from_common_source(path!(YAML, "flag"), path!(JSON, "unit"), &unit)
            .unwrap();
        assert!(ts.get(&path!(JSON, "unit", "contents")).is_none());
        assert!(ts.get(&path!(JSON, "unit", "name")).is_some());
    }

    #[test]
    fn common_source_claims_root_of_absent_value() {
        let mut ts = set();
        ts.add_translation(path!(YAML, "units"), path!(JSON, "units"))
            .unwrap();
        ts.add_from_common_source(path!(YAML, "flag"), path!(JSON, "units", 0_usize), &None::<String>)
            .unwrap();

        assert_eq!(
            ts.lookup(&path!(JSON, "units", 0_usize)),
            Provenance::Exact(path!(YAML, "flag"))
        );
        assert_eq!(
            ts.lookup(&path!(JSON, "units", 0_usize, "x")),
            Provenance::Approximate(path!(YAML, "flag"))
        );
        // sibling outside the subtree still follows the ancestor
        assert_eq!(
            ts.lookup(&path!(JSON, "units", 1_usize)),
            Provenance::Approximate(path!(YAML, "units", 1_usize))
        );
    }

    #[test]
    fn common_roots_follow_prefix() {
        let mut ts = set();
        ts.add_from_common_source(path!(YAML, "flag"), path!(JSON, "unit"), &json!({"a": 1}))
            .unwrap();
        let prefixed = ts.prefix("outer");
        assert_eq!(
            prefixed.lookup(&path!(JSON, "outer", "unit", "a", "deeper")),
            Provenance::Approximate(path!(YAML, "outer", "flag"))
        );
    }

    #[test]
    fn uncovered_lists_unmapped_leaves() {
        let mut ts = set();
        ts.add_identity(&["path"]).unwrap();
        let value = json!({"path": "/etc/motd", "mode": 420, "user": null});
        let missing = ts.uncovered(&value).unwrap();
        assert_eq!(missing, vec![path!(JSON, "mode")]);
    }

    #[test]
    fn display_lists_entries() {
        let mut ts = set();
        ts.add_translation(path!(YAML, "inline"), path!(JSON, "source"))
            .unwrap();
        let text = ts.to_string();
        assert!(text.starts_with("from yaml to json"));
        assert!(text.contains("yaml:$.inline -> json:$.source"));
    }

    #[test]
    fn serializes_translations_as_list() {
        let mut ts = set();
        ts.add_identity(&["a"]).unwrap();
        let value = serde_json::to_value(&ts).unwrap();
        assert_eq!(value["from_domain"], "yaml");
        assert_eq!(value["translations"].as_array().unwrap().len(), 1);
        assert_eq!(value["translations"][0]["to"]["segments"], json!(["a"]));
    }
}
