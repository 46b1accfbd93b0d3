//! Base v0.2 to Ignition v3.1 translation
//!
//! Most records map field for field and are declared with [`structural!`].
//! Records whose shape differs between the schemas (inline contents, the
//! mount-unit flag) get a custom translator. The Ignition version has no
//! source field and is generated by [`base::Config::to_ignition`].

use ignis_translate::{custom_only, path, structural, TranslateError, TranslationSet, Translator};

use super::v0_2 as base;
use crate::data_url;
use crate::error::ConfigError;
use crate::ignition::v3_1 as ign;
use crate::mount_unit::add_mount_units;
use crate::options::TranslateOptions;
use crate::{JSON, YAML};

type Translated<T> = Result<(T, TranslationSet), TranslateError>;

custom_only!(base::Ignition => ign::Ignition);
custom_only!(base::Resource => ign::Resource);
custom_only!(base::File => ign::File);
custom_only!(base::Directory => ign::Directory);
custom_only!(base::Link => ign::Link);
custom_only!(base::Filesystem => ign::Filesystem);

structural!(base::Config => ign::Config { ignition, passwd, storage, systemd });
structural!(base::IgnitionConfig => ign::IgnitionConfig { merge, replace });
structural!(base::HttpHeader => ign::HttpHeader { name, value });
structural!(base::Verification => ign::Verification { hash });
structural!(base::Proxy => ign::Proxy {
    http_proxy: "http_proxy" => "httpProxy",
    https_proxy: "https_proxy" => "httpsProxy",
    no_proxy: "no_proxy" => "noProxy",
});
structural!(base::Security => ign::Security { tls });
structural!(base::Tls => ign::Tls {
    certificate_authorities: "certificate_authorities" => "certificateAuthorities",
});
structural!(base::Timeouts => ign::Timeouts {
    http_response_headers: "http_response_headers" => "httpResponseHeaders",
    http_total: "http_total" => "httpTotal",
});
structural!(base::Passwd => ign::Passwd { users, groups });
structural!(base::PasswdUser => ign::PasswdUser {
    name,
    uid,
    password_hash: "password_hash" => "passwordHash",
    ssh_authorized_keys: "ssh_authorized_keys" => "sshAuthorizedKeys",
    home_dir: "home_dir" => "homeDir",
    shell,
    groups,
});
structural!(base::PasswdGroup => ign::PasswdGroup {
    name,
    gid,
    password_hash: "password_hash" => "passwordHash",
});
structural!(base::Storage => ign::Storage { directories, files, filesystems, links });
structural!(base::NodeUser => ign::NodeUser { id, name });
structural!(base::NodeGroup => ign::NodeGroup { id, name });
structural!(base::Systemd => ign::Systemd { units });
structural!(base::Unit => ign::Unit { name, enabled, mask, contents, dropins });
structural!(base::Dropin => ign::Dropin { name, contents });

/// Translator for subtrees that may contain resources
fn resource_translator() -> Result<Translator, TranslateError> {
    Translator::new(YAML, JSON).with_custom_translator(translate_resource)
}

fn translate_ignition(from: &base::Ignition) -> Translated<ign::Ignition> {
    let tr = resource_translator()?;
    let mut to = ign::Ignition::default();
    let mut ts = tr.empty_set();
    ts.merge_p("config", &tr.translate(&from.config, &mut to.config)?)?;
    ts.merge_p("proxy", &tr.translate(&from.proxy, &mut to.proxy)?)?;
    ts.merge_p("security", &tr.translate(&from.security, &mut to.security)?)?;
    ts.merge_p("timeouts", &tr.translate(&from.timeouts, &mut to.timeouts)?)?;
    Ok((to, ts))
}

/// Inline text takes precedence over `source` and becomes a `data:` URL
fn translate_resource(from: &base::Resource) -> Translated<ign::Resource> {
    let tr = Translator::new(YAML, JSON);
    let mut to = ign::Resource::default();
    let mut ts = tr.empty_set();
    ts.merge_p(
        "verification",
        &tr.translate(&from.verification, &mut to.verification)?,
    )?;
    ts.merge_with_prefix(
        "http_headers",
        "httpHeaders",
        &tr.translate(&from.http_headers, &mut to.http_headers)?,
    )?;
    to.compression.clone_from(&from.compression);
    ts.add_identity(&["compression"])?;

    if let Some(inline) = &from.inline {
        to.source = Some(data_url::encode(inline));
        ts.add_translation(path!(YAML, "inline"), path!(JSON, "source"))?;
    } else {
        to.source.clone_from(&from.source);
        ts.add_identity(&["source"])?;
    }
    Ok((to, ts))
}

fn translate_file(from: &base::File) -> Translated<ign::File> {
    let tr = resource_translator()?;
    let mut to = ign::File::default();
    let mut ts = tr.empty_set();
    ts.merge_p("group", &tr.translate(&from.group, &mut to.group)?)?;
    ts.merge_p("user", &tr.translate(&from.user, &mut to.user)?)?;
    ts.merge_p("append", &tr.translate(&from.append, &mut to.append)?)?;
    ts.merge_p("contents", &tr.translate(&from.contents, &mut to.contents)?)?;
    to.overwrite = from.overwrite;
    to.path.clone_from(&from.path);
    to.mode = from.mode;
    ts.add_identity(&["overwrite", "path", "mode"])?;
    Ok((to, ts))
}

fn translate_directory(from: &base::Directory) -> Translated<ign::Directory> {
    let tr = Translator::new(YAML, JSON);
    let mut to = ign::Directory::default();
    let mut ts = tr.empty_set();
    ts.merge_p("group", &tr.translate(&from.group, &mut to.group)?)?;
    ts.merge_p("user", &tr.translate(&from.user, &mut to.user)?)?;
    to.overwrite = from.overwrite;
    to.path.clone_from(&from.path);
    to.mode = from.mode;
    ts.add_identity(&["overwrite", "path", "mode"])?;
    Ok((to, ts))
}

fn translate_link(from: &base::Link) -> Translated<ign::Link> {
    let tr = Translator::new(YAML, JSON);
    let mut to = ign::Link::default();
    let mut ts = tr.empty_set();
    ts.merge_p("group", &tr.translate(&from.group, &mut to.group)?)?;
    ts.merge_p("user", &tr.translate(&from.user, &mut to.user)?)?;
    to.target.clone_from(&from.target);
    to.hard = from.hard;
    to.overwrite = from.overwrite;
    to.path.clone_from(&from.path);
    ts.add_identity(&["target", "hard", "overwrite", "path"])?;
    Ok((to, ts))
}

/// `with_mount_unit` has no counterpart here; see [`add_mount_units`]
fn translate_filesystem(from: &base::Filesystem) -> Translated<ign::Filesystem> {
    let tr = Translator::new(YAML, JSON);
    let mut to = ign::Filesystem::default();
    let mut ts = tr.empty_set();
    ts.merge_with_prefix(
        "mount_options",
        "mountOptions",
        &tr.translate(&from.mount_options, &mut to.mount_options)?,
    )?;
    ts.merge_p("options", &tr.translate(&from.options, &mut to.options)?)?;
    to.device.clone_from(&from.device);
    to.format.clone_from(&from.format);
    to.label.clone_from(&from.label);
    to.path.clone_from(&from.path);
    to.uuid.clone_from(&from.uuid);
    to.wipe_filesystem = from.wipe_filesystem;
    ts.add_identity(&["device", "format", "label", "path", "uuid"])?;
    ts.add_translation(path!(YAML, "wipe_filesystem"), path!(JSON, "wipeFilesystem"))?;
    Ok((to, ts))
}

impl base::Config {
    /// Translate to an Ignition v3.1 config
    ///
    /// Returns the generated config and the provenance of every value in it,
    /// addressed `yaml` on the source side and `json` on the generated side.
    ///
    /// # Errors
    /// - [`ConfigError::MissingMountPath`] if a filesystem asks for a mount
    ///   unit without a path
    /// - [`ConfigError::Translate`] or [`ConfigError::Template`] on internal
    ///   faults
    pub fn to_ignition(
        &self,
        options: &TranslateOptions,
    ) -> Result<(ign::Config, TranslationSet), ConfigError> {
        let tr = Translator::new(YAML, JSON)
            .with_custom_translator(translate_ignition)?
            .with_custom_translator(translate_file)?
            .with_custom_translator(translate_directory)?
            .with_custom_translator(translate_link)?
            .with_custom_translator(translate_filesystem)?;

        let mut ret = ign::Config::default();
        let mut ts = tr.translate(self, &mut ret)?;

        ret.ignition.version = ign::MAX_VERSION.to_string();
        ts.add_translation(path!(YAML, "version"), path!(JSON, "ignition", "version"))?;

        if options.emit_mount_units {
            ts.merge(add_mount_units(self, &mut ret)?)?;
        }

        if options.debug_print_translations {
            tracing::debug!(translations = %ts, "translated base config");
        }
        if options.verify_coverage {
            for missing in ts.uncovered(&ret)? {
                tracing::warn!(path = %missing, "generated value has no recorded source");
            }
        }
        tracing::info!(
            variant = %self.variant,
            version = %self.version,
            entries = ts.len(),
            "translated base config to ignition {}",
            ign::MAX_VERSION
        );
        Ok((ret, ts))
    }
}
