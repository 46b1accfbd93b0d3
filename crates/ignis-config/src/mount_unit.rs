//! Generated `.mount` units for declared filesystems
//!
//! A filesystem with `with_mount_unit: true` gets a systemd mount unit named
//! after its escaped path. If the user already declared a unit of that name,
//! only the fields they left unset are filled in.

use std::collections::HashMap;

use ignis_translate::{path, TranslationSet};
use once_cell::sync::Lazy;

use crate::base::v0_2 as base;
use crate::error::{ConfigError, TemplateError};
use crate::ignition::v3_1 as ign;
use crate::{JSON, YAML};

const MOUNT_UNIT_TEMPLATE: &str = "# Generated by Ignis
[Unit]
Before=local-fs.target
Requires=systemd-fsck@{escaped_device}.service
After=systemd-fsck@{escaped_device}.service

[Mount]
Where={path}
What={device}
Type={format}

[Install]
RequiredBy=local-fs.target
";

static MOUNT_UNIT: Lazy<Result<UnitTemplate, TemplateError>> =
    Lazy::new(|| UnitTemplate::compile(MOUNT_UNIT_TEMPLATE));

/// Values a unit template can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Device,
    EscapedDevice,
    Path,
    Format,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "device" => Some(Self::Device),
            "escaped_device" => Some(Self::EscapedDevice),
            "path" => Some(Self::Path),
            "format" => Some(Self::Format),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(&'static str),
    Field(Field),
}

/// Unit file template with `{name}` placeholders, checked at compile time of
/// the template rather than at render time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTemplate {
    parts: Vec<Part>,
}

impl UnitTemplate {
    /// Split `source` into literals and placeholders
    ///
    /// # Errors
    /// - [`TemplateError::Unterminated`] for a `{` with no matching `}`
    /// - [`TemplateError::UnknownPlaceholder`] for a name the renderer lacks
    pub fn compile(source: &'static str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut rest = source;
        let mut offset = 0;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(Part::Literal(&rest[..open]));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or(TemplateError::Unterminated {
                offset: offset + open,
            })?;
            let name = &after[..close];
            let field = Field::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                name: name.to_string(),
                offset: offset + open,
            })?;
            parts.push(Part::Field(field));
            let consumed = open + 1 + close + 1;
            rest = &rest[consumed..];
            offset += consumed;
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest));
        }
        Ok(Self { parts })
    }

    /// Render for one filesystem; absent values render empty
    #[must_use]
    pub fn render(&self, fs: &base::Filesystem, mount_path: &str) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Field(Field::Device) => out.push_str(&fs.device),
                Part::Field(Field::EscapedDevice) => out.push_str(&escape_path(&fs.device)),
                Part::Field(Field::Path) => out.push_str(mount_path),
                Part::Field(Field::Format) => out.push_str(fs.format.as_deref().unwrap_or_default()),
            }
        }
        out
    }
}

/// The built-in mount unit template, compiled on first use
///
/// # Errors
/// Returns the construction error if the built-in template is malformed
pub fn mount_unit_template() -> Result<&'static UnitTemplate, TemplateError> {
    MOUNT_UNIT.as_ref().map_err(Clone::clone)
}

/// Escape a filesystem path the way systemd names path-based units
///
/// Redundant slashes are dropped, remaining slashes become `-`, and bytes
/// outside `[A-Za-z0-9:_.]` (or a leading `.`) become `\xNN`. The root path
/// escapes to `-`.
#[must_use]
pub fn escape_path(path: &str) -> String {
    let trimmed: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    let joined = trimmed.join("/");

    let mut out = String::with_capacity(joined.len());
    for (i, byte) in joined.bytes().enumerate() {
        match byte {
            b'/' => out.push('-'),
            b'.' if i == 0 => out.push_str("\\x2e"),
            b if b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'.') => {
                out.push(char::from(b));
            }
            b => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out
}

/// Mount unit for one filesystem
///
/// # Errors
/// - [`ConfigError::MissingMountPath`] if the filesystem has no path
/// - [`ConfigError::Template`] if the built-in template is malformed
pub fn mount_unit(fs: &base::Filesystem, index: usize) -> Result<ign::Unit, ConfigError> {
    let mount_path = fs
        .path
        .as_deref()
        .ok_or(ConfigError::MissingMountPath { index })?;
    let template = mount_unit_template()?;
    Ok(ign::Unit {
        name: format!("{}.mount", escape_path(mount_path)),
        enabled: Some(true),
        contents: Some(template.render(fs, mount_path)),
        ..ign::Unit::default()
    })
}

/// Merge generated mount units into `ret`, returning their provenance
///
/// New units are appended in filesystem order and attributed wholly to the
/// triggering `with_mount_unit` flag. A same-named unit the user declared
/// keeps every field it sets; only unset `contents` and `enabled` are
/// filled, each with its own entry.
///
/// # Errors
/// Propagates [`mount_unit`] failures and translation conflicts
pub fn add_mount_units(
    config: &base::Config,
    ret: &mut ign::Config,
) -> Result<TranslationSet, ConfigError> {
    let mut ts = TranslationSet::new(YAML, JSON);
    if config.storage.filesystems.is_empty() {
        return Ok(ts);
    }

    let mut by_name: HashMap<String, usize> = ret
        .systemd
        .units
        .iter()
        .enumerate()
        .map(|(i, u)| (u.name.clone(), i))
        .collect();

    for (i, fs) in config.storage.filesystems.iter().enumerate() {
        if fs.with_mount_unit != Some(true) {
            continue;
        }
        let from = path!(YAML, "storage", "filesystems", i, "with_mount_unit");
        let generated = mount_unit(fs, i)?;

        if let Some(&existing) = by_name.get(&generated.name) {
            let unit = &mut ret.systemd.units[existing];
            let unit_path = path!(JSON, "systemd", "units", existing);
            let mut filled = Vec::new();
            if unit.contents.is_none() {
                unit.contents = generated.contents;
                ts.add_translation(from.clone(), unit_path.append("contents"))?;
                filled.push("contents");
            }
            if unit.enabled.is_none() {
                unit.enabled = generated.enabled;
                ts.add_translation(from, unit_path.append("enabled"))?;
                filled.push("enabled");
            }
            if !filled.is_empty() {
                tracing::debug!(unit = %unit.name, ?filled, "filled user-declared mount unit");
            }
        } else {
            let at = ret.systemd.units.len();
            ts.add_from_common_source(from, path!(JSON, "systemd", "units", at), &generated)?;
            tracing::debug!(unit = %generated.name, index = at, "appended generated mount unit");
            by_name.insert(generated.name.clone(), at);
            ret.systemd.units.push(generated);
        }
    }
    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ignis_translate::Provenance;
    use pretty_assertions::assert_eq;

    fn filesystem(path: &str) -> base::Filesystem {
        base::Filesystem {
            device: "/dev/disk/by-label/data".into(),
            format: Some("xfs".into()),
            path: Some(path.into()),
            with_mount_unit: Some(true),
            ..base::Filesystem::default()
        }
    }

    #[test]
    fn escape_path_matches_systemd() {
        assert_eq!(escape_path("/var/lib/data"), "var-lib-data");
        assert_eq!(escape_path("//var//srv/"), "var-srv");
        assert_eq!(escape_path("/"), "-");
        assert_eq!(escape_path("/var/my-dir"), "var-my\\x2ddir");
        assert_eq!(escape_path("/.hidden"), "\\x2ehidden");
        assert_eq!(escape_path("/dev/disk/by-label/data"), "dev-disk-by\\x2dlabel-data");
    }

    #[test]
    fn template_compiles() {
        let template = mount_unit_template().unwrap();
        assert!(template.parts.contains(&Part::Field(Field::EscapedDevice)));
    }

    #[test]
    fn template_rejects_unknown_placeholder() {
        let err = UnitTemplate::compile("What={size}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "size".into(),
                offset: 5
            }
        );
    }

    #[test]
    fn template_rejects_unterminated_placeholder() {
        let err = UnitTemplate::compile("a{path}b{dev").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated { offset: 8 });
    }

    #[test]
    fn mount_unit_renders_filesystem() {
        let unit = mount_unit(&filesystem("/var/lib/data"), 0).unwrap();
        assert_eq!(unit.name, "var-lib-data.mount");
        assert_eq!(unit.enabled, Some(true));
        let contents = unit.contents.unwrap();
        assert!(contents.contains("Where=/var/lib/data\n"));
        assert!(contents.contains("What=/dev/disk/by-label/data\n"));
        assert!(contents.contains("Type=xfs\n"));
        assert!(contents.contains("Requires=systemd-fsck@dev-disk-by\\x2dlabel-data.service\n"));
    }

    #[test]
    fn mount_unit_requires_path() {
        let fs = base::Filesystem {
            path: None,
            ..filesystem("/x")
        };
        assert!(matches!(
            mount_unit(&fs, 3),
            Err(ConfigError::MissingMountPath { index: 3 })
        ));
    }

    #[test]
    fn new_units_follow_filesystem_order() {
        let mut config = base::Config::default();
        config.storage.filesystems = vec![
            filesystem("/b"),
            base::Filesystem {
                with_mount_unit: Some(false),
                ..filesystem("/skipped")
            },
            filesystem("/a"),
        ];
        let mut ret = ign::Config::default();
        ret.systemd.units.push(ign::Unit {
            name: "other.service".into(),
            ..ign::Unit::default()
        });

        let ts = add_mount_units(&config, &mut ret).unwrap();
        let names: Vec<&str> = ret.systemd.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["other.service", "b.mount", "a.mount"]);
        assert_eq!(
            ts.lookup(&path!(JSON, "systemd", "units", 2_usize, "contents")),
            Provenance::Exact(path!(YAML, "storage", "filesystems", 2_usize, "with_mount_unit"))
        );
    }

    #[test]
    fn user_fields_win_over_generated() {
        let mut config = base::Config::default();
        config.storage.filesystems = vec![filesystem("/var/lib/data")];
        let mut ret = ign::Config::default();
        ret.systemd.units.push(ign::Unit {
            name: "var-lib-data.mount".into(),
            enabled: Some(false),
            ..ign::Unit::default()
        });

        let ts = add_mount_units(&config, &mut ret).unwrap();
        assert_eq!(ret.systemd.units.len(), 1);
        assert_eq!(ret.systemd.units[0].enabled, Some(false));
        assert!(ret.systemd.units[0].contents.is_some());
        assert_eq!(ts.len(), 1);
        assert!(ts
            .get(&path!(JSON, "systemd", "units", 0_usize, "contents"))
            .is_some());
    }

    #[test]
    fn fully_declared_unit_is_left_alone() {
        let mut config = base::Config::default();
        config.storage.filesystems = vec![filesystem("/var/lib/data")];
        let declared = ign::Unit {
            name: "var-lib-data.mount".into(),
            enabled: Some(false),
            contents: Some("[Mount]\n".into()),
            ..ign::Unit::default()
        };
        let mut ret = ign::Config::default();
        ret.systemd.units.push(declared.clone());

        let ts = add_mount_units(&config, &mut ret).unwrap();
        assert!(ts.is_empty());
        assert_eq!(ret.systemd.units, vec![declared]);
    }

    #[test]
    fn duplicate_mount_paths_generate_one_unit() {
        let mut config = base::Config::default();
        config.storage.filesystems = vec![filesystem("/srv"), filesystem("/srv/")];
        let mut ret = ign::Config::default();
        add_mount_units(&config, &mut ret).unwrap();
        assert_eq!(ret.systemd.units.len(), 1);
    }
}
