//! Error types for listing and acquiring images.
//!
//! [`StoreError`] is what an [`crate::store::ImageStore`] backend reports;
//! [`ImageError`] is the taxonomy surfaced to callers of this crate.

use thiserror::Error;

/// An error reported by an image store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No local image matches the given reference.
    #[error("image not known: {0}")]
    NotFound(String),
    /// Any other failure (transport, permissions, subprocess, parsing...).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether this is a [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors surfaced by the filter compiler and the acquisition resolvers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageError {
    /// A filter expression used a key we do not know about.
    #[error("invalid filter {0:?}")]
    UnknownFilterKey(String),
    /// A filter expression has a recognized key but an unusable value.
    #[error("invalid filter value in {0:?}")]
    InvalidFilterValue(String),
    /// A `before=`/`after=` filter names an image that is not stored locally.
    #[error("unable to find image {reference:?} in local stores")]
    UnresolvableReference {
        /// The reference as given by the user
        reference: String,
        /// Why the store could not resolve it
        #[source]
        source: StoreError,
    },
    /// Registry credentials were not of the form `USERNAME:PASSWORD`.
    #[error("invalid credentials: expected USERNAME:PASSWORD")]
    MalformedCredentials,
    /// No transport interpretation of a load source succeeded.
    #[error("error pulling {source_ref:?}")]
    UnrecognizedImageSource {
        /// The source string exactly as provided
        source_ref: String,
        /// The error from the last transport attempted
        #[source]
        last_error: StoreError,
    },
    /// A registry pull failed.
    #[error("error pulling image {reference:?}")]
    Pull {
        /// The image reference being pulled
        reference: String,
        /// The store's error, unchanged
        #[source]
        source: StoreError,
    },
    /// A store operation failed outside of the cases above.
    #[error("{context}")]
    Store {
        /// What we were doing
        context: String,
        /// The store's error, unchanged
        #[source]
        source: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImageError::UnknownFilterKey("foo".into());
        assert_eq!(err.to_string(), r#"invalid filter "foo""#);

        let err = ImageError::UnrecognizedImageSource {
            source_ref: "/tmp/img.tar".into(),
            last_error: StoreError::Other(anyhow::anyhow!("no such directory")),
        };
        assert_eq!(err.to_string(), r#"error pulling "/tmp/img.tar""#);
        // The chain must carry the underlying failure for `{:#}` display
        let chained = format!("{:#}", anyhow::Error::new(err));
        assert!(chained.contains("no such directory"), "{chained}");
    }

    #[test]
    fn test_store_error_not_found() {
        assert!(StoreError::NotFound("busybox".into()).is_not_found());
        assert!(!StoreError::Other(anyhow::anyhow!("boom")).is_not_found());
    }
}
