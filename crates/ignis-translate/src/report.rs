//! Diagnostic reports and their remapping into the source tree
//!
//! Validation of a generated document reports problems against destination
//! paths the author never wrote. [`TranslationSet::map_report`] rewrites each
//! entry's context to the best-matching source path.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::path::Path;
use crate::set::TranslationSet;

/// Severity of a report entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational
    Info,
    /// Suspicious but accepted
    Warn,
    /// Fatal for the document
    Error,
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warn => "warning",
            Self::Error => "error",
        })
    }
}

/// One diagnostic, optionally located at a path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Severity
    pub level: Level,
    /// Human-readable description
    pub message: String,
    /// Location the diagnostic applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Path>,
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(path) => write!(f, "{} at {}:{}: {}", self.level, path.domain(), path, self.message),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<Entry>,
}

impl Report {
    /// Create new empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Add an error at `context`
    pub fn add_error(&mut self, context: Path, message: impl Into<String>) {
        self.push(Entry {
            level: Level::Error,
            message: message.into(),
            context: Some(context),
        });
    }

    /// Add a warning at `context`
    pub fn add_warn(&mut self, context: Path, message: impl Into<String>) {
        self.push(Entry {
            level: Level::Warn,
            message: message.into(),
            context: Some(context),
        });
    }

    /// Append all entries of another report
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    /// Entries in insertion order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if report has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if any entry is an error
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|e| e.level == Level::Error)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl TranslationSet {
    /// Rewrite destination-domain contexts of `report` into the source domain
    ///
    /// Entries without a context, or already in another domain, are kept as
    /// they are. Unresolvable contexts stay on the destination path.
    #[must_use]
    pub fn map_report(&self, report: &Report) -> Report {
        let entries = report
            .entries
            .iter()
            .map(|entry| {
                let context = match &entry.context {
                    Some(path) if path.domain() == self.to_domain() => {
                        Some(self.lookup(path).into_path())
                    }
                    other => other.clone(),
                };
                Entry {
                    level: entry.level,
                    message: entry.message.clone(),
                    context,
                }
            })
            .collect();
        Report { entries }
    }
}
