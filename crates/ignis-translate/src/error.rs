//! Error types for the translation engine
//!
//! Every variant is a fault in the calling code (the schema-version glue),
//! never a property of user input. Lookup misses are not errors; see
//! [`Provenance`](crate::Provenance).

use crate::path::Domain;

/// Translation engine errors
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// A custom translator for this source type is already registered
    #[error("custom translator for {from} already registered (producing {existing})")]
    DuplicateTranslator {
        /// Source type name
        from: &'static str,
        /// Destination type of the translator already registered
        existing: &'static str,
    },

    /// A custom translator was reached at a field of a different destination type
    #[error("custom translator for {from} produces {registered}, but the field being walked is {expected}")]
    TranslatorTypeMismatch {
        /// Source type name
        from: &'static str,
        /// Destination type the translator was registered with
        registered: &'static str,
        /// Destination type of the field being walked
        expected: &'static str,
    },

    /// A type that has no structural translation was walked without its custom translator
    #[error("no custom translator registered for {from} -> {to}")]
    MissingTranslator {
        /// Source type name
        from: &'static str,
        /// Destination type name
        to: &'static str,
    },

    /// Two sources claim the same destination path
    #[error("conflicting translations for {to}: already mapped from {existing}, also claimed by {incoming}")]
    Conflict {
        /// Destination path claimed twice
        to: String,
        /// Source path already recorded
        existing: String,
        /// Source path of the rejected claim
        incoming: String,
    },

    /// A path was tagged with the wrong domain for its side of the set
    #[error("path {path} is in domain {found}, expected {expected}")]
    DomainMismatch {
        /// Offending path
        path: String,
        /// Domain the set expects on this side
        expected: Domain,
        /// Domain the path carries
        found: Domain,
    },

    /// Enumerating the leaves of a destination subtree failed
    #[error("cannot enumerate destination subtree: {0}")]
    Subtree(#[from] serde_json::Error),
}

impl TranslateError {
    /// Check if error is a destination path conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
