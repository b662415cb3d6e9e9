//! Load an image from a local file or directory whose format is not known
//! up front.
//!
//! Each [`Transport`] is tried in turn ([`Transport::LOAD_ORDER`]); the
//! first one the store accepts wins. Only the error of the last attempt is
//! reported, earlier ones are logged at debug level.

use camino::Utf8PathBuf;

use crate::error::{ImageError, StoreError};
use crate::store::{ImageStore, PullOptions};
use crate::transport::Transport;

/// Options for [`load_image`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Suppress progress output.
    pub quiet: bool,
    /// Path of the signature policy file.
    pub signature_policy: Option<Utf8PathBuf>,
}

impl LoadOptions {
    fn pull_options(&self) -> PullOptions {
        PullOptions {
            signature_policy: self.signature_policy.clone(),
            quiet: self.quiet,
            ..Default::default()
        }
    }
}

/// Where a load currently stands.
#[derive(Debug)]
pub enum AcquireState {
    /// The transport at `index` in the chain is next to be attempted.
    Trying {
        /// Position in the chain
        index: usize,
        /// The transport at that position
        transport: Transport,
    },
    /// A transport succeeded with this image name.
    Loaded(String),
    /// Every transport failed; this is the error of the last one.
    Failed(StoreError),
}

/// Drives the transport fallback chain for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResolver {
    transports: Vec<Transport>,
}

impl Default for LoadResolver {
    fn default() -> Self {
        Self {
            transports: Transport::LOAD_ORDER.to_vec(),
        }
    }
}

impl LoadResolver {
    /// Try only `transports`, in the given order.
    pub fn with_transports(transports: impl IntoIterator<Item = Transport>) -> Self {
        Self {
            transports: transports.into_iter().collect(),
        }
    }

    /// The state a load starts in.
    pub fn initial(&self) -> AcquireState {
        match self.transports.first() {
            Some(&transport) => AcquireState::Trying {
                index: 0,
                transport,
            },
            None => AcquireState::Failed(StoreError::Other(anyhow::anyhow!(
                "No transports to try"
            ))),
        }
    }

    /// Perform the attempt for `state` and return the following state.
    /// Terminal states are returned unchanged.
    pub fn step(
        &self,
        store: &dyn ImageStore,
        state: AcquireState,
        source: &str,
        tag_hint: Option<&str>,
        opts: &PullOptions,
    ) -> AcquireState {
        let (index, transport) = match state {
            AcquireState::Trying { index, transport } => (index, transport),
            terminal => return terminal,
        };
        let candidate = transport.source_for(source, tag_hint);
        tracing::debug!("Trying to load {candidate}");
        let err = match store.pull(&candidate, opts) {
            Ok(name) => return AcquireState::Loaded(name),
            Err(e) => e,
        };
        match self.transports.get(index + 1) {
            Some(&next) => {
                tracing::debug!("Loading {candidate} failed: {err:#}");
                AcquireState::Trying {
                    index: index + 1,
                    transport: next,
                }
            }
            None => AcquireState::Failed(err),
        }
    }

    /// Run the chain to completion.
    pub fn resolve(
        &self,
        store: &dyn ImageStore,
        source: &str,
        tag_hint: Option<&str>,
        opts: &LoadOptions,
    ) -> Result<String, ImageError> {
        let pull_opts = opts.pull_options();
        let mut state = self.initial();
        loop {
            state = match state {
                AcquireState::Loaded(name) => return Ok(name),
                AcquireState::Failed(last_error) => {
                    return Err(ImageError::UnrecognizedImageSource {
                        source_ref: source.to_string(),
                        last_error,
                    })
                }
                trying => self.step(store, trying, source, tag_hint, &pull_opts),
            };
        }
    }
}

/// Load the image at `source` (a path), trying every local transport.
///
/// `tag_hint` selects one image inside an OCI archive holding several.
pub fn load_image(
    store: &dyn ImageStore,
    source: &str,
    tag_hint: Option<&str>,
    opts: &LoadOptions,
) -> Result<String, ImageError> {
    LoadResolver::default().resolve(store, source, tag_hint, opts)
}
