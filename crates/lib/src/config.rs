//! Optional defaults from a TOML file.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;
use serde::Deserialize;

/// The environment variable that can be used to specify a config file.
const CONFIG_VAR: &str = "CIMG_CONFIG";

/// Read when [`CONFIG_VAR`] is unset, if it exists.
const DEFAULT_CONFIG_PATH: &str = "/etc/containers/cimg.toml";

/// Settings which command line flags override.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Path to the podman binary.
    pub podman: Option<Utf8PathBuf>,
    /// Default for `--tls-verify`.
    pub tls_verify: Option<bool>,
    /// Default for `--cert-dir`.
    pub cert_dir: Option<Utf8PathBuf>,
    /// Default for `--authfile`.
    pub authfile: Option<Utf8PathBuf>,
    /// Default for `--signature-policy`.
    pub signature_policy: Option<Utf8PathBuf>,
}

impl Config {
    /// Parse a config document.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from `$CIMG_CONFIG`, else the default path if present.
    /// An explicitly named file must exist.
    #[context("Loading config")]
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_VAR) {
            let path = Utf8PathBuf::try_from(std::path::PathBuf::from(path))
                .context("Non-UTF-8 config path")?;
            return Self::load_from(&path);
        }
        let path = Utf8Path::new(DEFAULT_CONFIG_PATH);
        if !path.try_exists()? {
            tracing::trace!("No config at {path}");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load from `path`.
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("Opening {path}"))?;
        let r = Self::parse(&s).with_context(|| format!("Parsing config from {path}"))?;
        tracing::debug!("Loaded config from {path}");
        Ok(r)
    }
}
