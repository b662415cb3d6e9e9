//! An in-memory [`ImageStore`] for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::image::ImageRecord;
use crate::store::{ImageStore, PullOptions};

/// A fixed reference time so tests never depend on the wall clock.
pub(crate) fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub(crate) fn record(id: &str, names: &[&str], created: DateTime<Utc>) -> ImageRecord {
    ImageRecord::new(id, names.iter().map(|s| s.to_string()), created)
}

/// The two-image catalog used by several tests: one tagged image and one
/// dangling image created an hour earlier without a known size.
pub(crate) fn sample_catalog() -> Vec<ImageRecord> {
    vec![
        record("a1", &["x:latest"], t0()).with_size(Some(1_000_000)),
        record("a2", &[], t0() - Duration::hours(1)),
    ]
}

#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    pub(crate) images: Vec<ImageRecord>,
    /// Pull results keyed by exact source string; missing keys fail.
    pub(crate) pullable: HashMap<String, String>,
    /// Every source passed to `pull`, in order.
    pub(crate) attempts: RefCell<Vec<String>>,
    /// Options seen by the last `pull`.
    pub(crate) last_opts: RefCell<Option<PullOptions>>,
}

impl FakeStore {
    pub(crate) fn new(images: Vec<ImageRecord>) -> Self {
        Self {
            images,
            ..Default::default()
        }
    }

    pub(crate) fn with_pullable(mut self, source: &str, name: &str) -> Self {
        self.pullable.insert(source.to_string(), name.to_string());
        self
    }

    pub(crate) fn attempts(&self) -> Vec<String> {
        self.attempts.borrow().clone()
    }
}

impl ImageStore for FakeStore {
    fn list_images(&self) -> Result<Vec<ImageRecord>, StoreError> {
        Ok(self.images.clone())
    }

    fn resolve_reference(&self, reference: &str) -> Result<ImageRecord, StoreError> {
        self.images
            .iter()
            .find(|r| r.id.starts_with(reference) || r.repo_tags.iter().any(|t| t == reference))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    fn pull(&self, source: &str, opts: &PullOptions) -> Result<String, StoreError> {
        self.attempts.borrow_mut().push(source.to_string());
        *self.last_opts.borrow_mut() = Some(opts.clone());
        self.pullable
            .get(source)
            .cloned()
            .ok_or_else(|| StoreError::Other(anyhow::anyhow!("cannot pull {source}")))
    }
}
