//! Pull an image from a registry.

use camino::Utf8PathBuf;

use crate::error::ImageError;
use crate::store::{ImageStore, PullOptions, RegistryCredentials, RegistryOptions};

/// User-facing options for [`pull_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPullOpts {
    /// Credentials as `USERNAME:PASSWORD`.
    pub creds: Option<String>,
    /// Directory holding TLS certificates and keys.
    pub cert_dir: Option<Utf8PathBuf>,
    /// Require HTTPS and verify certificates.
    pub tls_verify: bool,
    /// Path of the registry authentication file.
    pub authfile: Option<Utf8PathBuf>,
    /// Path of the signature policy file.
    pub signature_policy: Option<Utf8PathBuf>,
    /// Suppress progress output.
    pub quiet: bool,
}

impl Default for RegistryPullOpts {
    fn default() -> Self {
        Self {
            creds: None,
            cert_dir: None,
            tls_verify: true,
            authfile: None,
            signature_policy: None,
            quiet: false,
        }
    }
}

/// The result of a successful pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// The name reported by the store.
    pub name: String,
    /// The stored image id, if it could be looked up afterwards.
    pub id: Option<String>,
}

/// Split `USERNAME:PASSWORD` at the first colon. The password may be empty
/// or contain further colons; the username may not be empty.
pub fn parse_registry_creds(creds: &str) -> Result<RegistryCredentials, ImageError> {
    match creds.split_once(':') {
        Some((username, password)) if !username.is_empty() => Ok(RegistryCredentials {
            username: username.to_string(),
            password: password.to_string(),
        }),
        _ => Err(ImageError::MalformedCredentials),
    }
}

impl RegistryPullOpts {
    /// Validate and convert into the options passed to the store.
    pub fn to_pull_options(&self) -> Result<PullOptions, ImageError> {
        let creds = self
            .creds
            .as_deref()
            .map(parse_registry_creds)
            .transpose()?;
        Ok(PullOptions {
            signature_policy: self.signature_policy.clone(),
            authfile: self.authfile.clone(),
            registry: RegistryOptions {
                creds,
                cert_dir: self.cert_dir.clone(),
                tls_verify: self.tls_verify,
            },
            quiet: self.quiet,
        })
    }
}

/// Pull `reference` with a single store attempt, then look up the stored
/// image id. A failed lookup is logged and leaves [`PullOutcome::id`] unset.
pub fn pull_image(
    store: &dyn ImageStore,
    reference: &str,
    opts: &RegistryPullOpts,
) -> Result<PullOutcome, ImageError> {
    let pull_opts = opts.to_pull_options()?;
    tracing::debug!("Pulling {reference}");
    let name = store
        .pull(reference, &pull_opts)
        .map_err(|source| ImageError::Pull {
            reference: reference.to_string(),
            source,
        })?;
    let id = match store.resolve_reference(reference) {
        Ok(image) => Some(image.id),
        Err(e) => {
            tracing::debug!("Looking up pulled image {reference}: {e:#}");
            None
        }
    };
    Ok(PullOutcome { name, id })
}
