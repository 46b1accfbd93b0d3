//! Error types for config translation
//!
//! Provides error handling for:
//! - Translation engine faults (bugs in the version glue)
//! - Generated-unit template construction failures
//! - Inputs the mount-unit generator cannot work with

use ignis_translate::TranslateError;

/// Config translation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Translation engine fault
    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    /// Generated unit template is malformed
    #[error("unit template error: {0}")]
    Template(#[from] TemplateError),

    /// Filesystem asks for a mount unit but has no mount path
    #[error("storage.filesystems.{index} sets with_mount_unit but has no path")]
    MissingMountPath {
        /// Position in `storage.filesystems`
        index: usize,
    },
}

impl ConfigError {
    /// Check if error is a defect in this crate rather than in the input
    #[inline]
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Translate(_) | Self::Template(_))
    }
}

/// Template construction errors
///
/// Raised once, when the template is first compiled; never a property of the
/// config being translated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder not known to the renderer
    #[error("unknown placeholder {{{name}}} at byte {offset}")]
    UnknownPlaceholder {
        /// Placeholder name
        name: String,
        /// Byte offset of the opening brace
        offset: usize,
    },

    /// Opening brace without a closing one
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening brace
        offset: usize,
    },
}
