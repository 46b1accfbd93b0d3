//! Testing utilities for the Ignis workspace
//!
//! Shared fixtures, tracing setup, and provenance assertions.

#![allow(missing_docs)]

use std::sync::Once;

use ignis_config::base::v0_2 as base;
use ignis_config::ignition::v3_1 as ign;
use ignis_config::TranslateOptions;
use ignis_translate::{Path, Provenance, TranslationSet};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test subscriber honouring `RUST_LOG` (default `warn`)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Parse a base config fixture
pub fn base_config(yaml: &str) -> base::Config {
    serde_yaml::from_str(yaml).unwrap()
}

/// Translate with every diagnostic option on
pub fn translate(config: &base::Config) -> (ign::Config, TranslationSet) {
    init_tracing();
    let options = TranslateOptions::new()
        .with_debug_print_translations(true)
        .with_verify_coverage(true);
    config.to_ignition(&options).unwrap()
}

pub fn filesystem(device: &str, path: &str) -> base::Filesystem {
    base::Filesystem {
        device: device.to_string(),
        format: Some("xfs".to_string()),
        path: Some(path.to_string()),
        with_mount_unit: Some(true),
        ..base::Filesystem::default()
    }
}

pub fn inline_file(path: &str, text: &str) -> base::File {
    base::File {
        path: path.to_string(),
        contents: base::Resource {
            inline: Some(text.to_string()),
            ..base::Resource::default()
        },
        ..base::File::default()
    }
}

/// Assert `to` resolves exactly to `from`
#[track_caller]
pub fn assert_exact(ts: &TranslationSet, to: &Path, from: &Path) {
    assert_eq!(ts.lookup(to), Provenance::Exact(from.clone()), "lookup of {to}");
}
