//! Ignis Config
//!
//! Versioned config schemas and their translation to Ignition, built on
//! [`ignis_translate`]. Every value in a generated Ignition config can be
//! traced back to the field of the source document it came from, so
//! validation errors against the output can be reported against the input.
//!
//! # Example
//!
//! ```rust
//! use ignis_config::{base::v0_2, TranslateOptions, JSON};
//! use ignis_translate::path;
//!
//! let mut config = v0_2::Config::default();
//! config.storage.files.push(v0_2::File {
//!     path: "/etc/motd".into(),
//!     contents: v0_2::Resource {
//!         inline: Some("hello".into()),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! });
//!
//! let (ignition, translations) = config.to_ignition(&TranslateOptions::default()).unwrap();
//! assert_eq!(ignition.storage.files[0].contents.source.as_deref(), Some("data:,hello"));
//!
//! let origin = translations.lookup(&path!(JSON, "storage", "files", 0_usize, "contents", "source"));
//! assert_eq!(origin.path().to_string(), "$.storage.files.0.contents.inline");
//! ```

#![warn(unreachable_pub)]
// Schema fields mirror the documents they describe.
#![allow(missing_docs)]

pub mod base;
pub mod data_url;
pub mod error;
pub mod ignition;
pub mod mount_unit;
pub mod options;

use ignis_translate::Domain;

pub use error::{ConfigError, TemplateError};
pub use options::TranslateOptions;

/// Domain of source documents
pub const YAML: Domain = Domain::new("yaml");

/// Domain of generated Ignition configs
pub const JSON: Domain = Domain::new("json");

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
