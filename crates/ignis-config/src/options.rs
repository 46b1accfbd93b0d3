//! Translation options

use serde::{Deserialize, Serialize};

/// Options controlling a whole-document translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateOptions {
    /// Log the final translation set at debug level
    pub debug_print_translations: bool,
    /// Log every generated leaf that has no recorded provenance
    pub verify_coverage: bool,
    /// Synthesize `.mount` units for filesystems with `with_mount_unit`
    pub emit_mount_units: bool,
}

impl TranslateOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With translation set dump
    #[inline]
    #[must_use]
    pub fn with_debug_print_translations(mut self, enabled: bool) -> Self {
        self.debug_print_translations = enabled;
        self
    }

    /// With provenance coverage check
    #[inline]
    #[must_use]
    pub fn with_verify_coverage(mut self, enabled: bool) -> Self {
        self.verify_coverage = enabled;
        self
    }

    /// With mount unit synthesis
    #[inline]
    #[must_use]
    pub fn with_mount_units(mut self, enabled: bool) -> Self {
        self.emit_mount_units = enabled;
        self
    }
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            debug_print_translations: false,
            verify_coverage: false,
            emit_mount_units: true,
        }
    }
}
