//! The metadata snapshot of one locally stored image.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// The algorithm prefix used for content-addressed image identifiers.
pub const ID_ALGORITHM_PREFIX: &str = "sha256:";

/// One stored image, as reported by an [`crate::store::ImageStore`].
///
/// This is read-only to everything in this crate; backends construct it and
/// the listing pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Content-derived identifier (hex, without algorithm prefix); never empty.
    pub id: String,
    /// Human-assigned `name:tag` strings; empty for a dangling image.
    pub repo_tags: Vec<String>,
    /// Repository part of the first entry in `repo_tags`, or empty.
    pub repository: String,
    /// Tag part of the first entry in `repo_tags`, or empty.
    pub tag: String,
    /// Manifest digest, stable across re-tagging.
    pub digest: String,
    /// When the image was created (not when it was pulled).
    pub created: DateTime<Utc>,
    /// Size in bytes; `None` when the store cannot compute it.
    pub size: Option<u64>,
    /// Image labels.
    pub labels: BTreeMap<String, String>,
}

impl ImageRecord {
    /// Create a record from its names; `repository` and `tag` are derived
    /// from the first name. Duplicate names are dropped, keeping the first.
    pub fn new(
        id: impl Into<String>,
        names: impl IntoIterator<Item = String>,
        created: DateTime<Utc>,
    ) -> Self {
        let mut repo_tags: Vec<String> = Vec::new();
        for name in names {
            if !repo_tags.contains(&name) {
                repo_tags.push(name);
            }
        }
        let (repository, tag) = repo_tags
            .first()
            .map(|n| {
                let (r, t) = split_repo_tag(n);
                (r.to_owned(), t.to_owned())
            })
            .unwrap_or_default();
        Self {
            id: id.into(),
            repo_tags,
            repository,
            tag,
            digest: String::new(),
            created,
            size: None,
            labels: BTreeMap::new(),
        }
    }

    /// Set the manifest digest.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// Set the labels.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = (String, String)>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    /// An image with no human-assigned names.
    pub fn is_dangling(&self) -> bool {
        self.repo_tags.is_empty()
    }
}

/// Split `name[:tag]` into repository and tag. The tag separator is the last
/// `:` after the last `/`, so registry ports (`localhost:5000/app`) are kept
/// in the repository. A trailing `@digest` is not a tag.
pub fn split_repo_tag(name: &str) -> (&str, &str) {
    let name = name.split_once('@').map(|(n, _)| n).unwrap_or(name);
    let path_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[path_start..].rfind(':') {
        Some(i) => {
            let i = path_start + i;
            (&name[..i], &name[i + 1..])
        }
        None => (name, ""),
    }
}

/// The id with its algorithm prefix stripped, if present.
pub fn strip_id_prefix(id: &str) -> &str {
    id.strip_prefix(ID_ALGORITHM_PREFIX).unwrap_or(id)
}
