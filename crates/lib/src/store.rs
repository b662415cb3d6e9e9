//! The [`ImageStore`] is the collaborator that actually owns image
//! content: it reports the local catalog, resolves references to stored
//! images, and performs one transport-specific acquisition per [`ImageStore::pull`].
//!
//! Everything else in this crate takes the store as an explicit parameter;
//! there is no process-wide runtime handle.

use camino::Utf8PathBuf;

use crate::error::StoreError;
use crate::image::ImageRecord;

/// Username and password for a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    /// The user name; never empty.
    pub username: String,
    /// The password; may be empty.
    pub password: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authentication and TLS settings for talking to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Explicit credentials, overriding any auth file.
    pub creds: Option<RegistryCredentials>,
    /// Directory holding TLS certificates and keys.
    pub cert_dir: Option<Utf8PathBuf>,
    /// Require HTTPS and verify certificates.
    pub tls_verify: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            creds: None,
            cert_dir: None,
            tls_verify: true,
        }
    }
}

/// Options for a single [`ImageStore::pull`] attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    /// Path of the signature policy file.
    pub signature_policy: Option<Utf8PathBuf>,
    /// Path of the registry authentication file.
    pub authfile: Option<Utf8PathBuf>,
    /// Registry auth/TLS; ignored by archive and directory transports.
    pub registry: RegistryOptions,
    /// Suppress progress output.
    pub quiet: bool,
}

/// The local image store.
///
/// Implementations must report failures as errors (never panic) so callers
/// can move on to another candidate, and must fail cheaply on input that
/// does not match the requested transport.
pub trait ImageStore {
    /// Snapshot of every locally stored image, in the store's own order.
    fn list_images(&self) -> Result<Vec<ImageRecord>, StoreError>;

    /// Resolve a name, name:tag or id (prefix) to a stored image.
    /// Returns [`StoreError::NotFound`] when nothing matches.
    fn resolve_reference(&self, reference: &str) -> Result<ImageRecord, StoreError>;

    /// Acquire an image from `source` (a transport-qualified reference or a
    /// plain registry reference) and return the resulting image name.
    fn pull(&self, source: &str, opts: &PullOptions) -> Result<String, StoreError>;
}

impl<S: ImageStore + ?Sized> ImageStore for &S {
    fn list_images(&self) -> Result<Vec<ImageRecord>, StoreError> {
        (**self).list_images()
    }

    fn resolve_reference(&self, reference: &str) -> Result<ImageRecord, StoreError> {
        (**self).resolve_reference(reference)
    }

    fn pull(&self, source: &str, opts: &PullOptions) -> Result<String, StoreError> {
        (**self).pull(source, opts)
    }
}
