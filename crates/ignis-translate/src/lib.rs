//! Ignis Translation Engine
//!
//! Converts an instance of one typed configuration tree into another while
//! recording, for every value copied or synthesized, where it came from.
//!
//! # Core Concepts
//!
//! - [`Path`]: Domain-tagged location inside a source or destination tree
//! - [`TranslationSet`]: Provenance entries with a merge/prefix algebra
//! - [`CustomTranslators`]: Per-type overrides of the structural walk
//! - [`Translator`]: The lockstep walk that populates the destination
//! - [`Report`]: Diagnostics remapped from destination to source paths
//!
//! # Example
//!
//! ```rust,ignore
//! use ignis_translate::{path, Translator};
//!
//! let tr = Translator::new("yaml", "json");
//! let mut out = target::Config::default();
//! let translations = tr.translate(&source, &mut out)?;
//!
//! // Resolve a validation error in the output back to the input
//! let origin = translations.lookup(&path!("json", "storage", "files", 0_usize, "path"));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod error;
mod path;
mod registry;
mod report;
mod set;
mod translator;

pub use error::TranslateError;
pub use path::{Domain, Path, Segment};
pub use registry::{CustomTranslators, OverrideFn};
pub use report::{Entry, Level, Report};
pub use set::{Provenance, Translation, TranslationSet};
pub use translator::{Translatable, Translator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
