//! An [`ImageStore`] backed by the `podman` CLI.

use std::collections::BTreeMap;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use cimg_utils::{CommandOutputExt, CommandRunExt};
use fn_error_context::context;
use serde::Deserialize;

use crate::error::StoreError;
use crate::image::ImageRecord;
use crate::store::{ImageStore, PullOptions};

/// The default binary, looked up in `$PATH`.
pub const DEFAULT_PODMAN: &str = "podman";

/// Stderr fragments meaning the requested image does not exist locally.
const NOT_FOUND_MARKERS: &[&str] = &["image not known", "no such image", "failed to find image"];

/// One entry of `podman images --format json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListEntry {
    id: String,
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    digest: String,
    created: i64,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

/// One entry of `podman image inspect --format json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    id: String,
    #[serde(default)]
    repo_tags: Option<Vec<String>>,
    #[serde(default)]
    digest: String,
    created: DateTime<Utc>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

impl TryFrom<ListEntry> for ImageRecord {
    type Error = anyhow::Error;

    fn try_from(e: ListEntry) -> Result<Self> {
        let created = DateTime::from_timestamp(e.created, 0)
            .with_context(|| format!("Invalid creation time {} for {}", e.created, e.id))?;
        Ok(
            ImageRecord::new(e.id, e.names.unwrap_or_default(), created)
                .with_digest(e.digest)
                .with_size(e.size)
                .with_labels(e.labels.unwrap_or_default()),
        )
    }
}

impl From<InspectEntry> for ImageRecord {
    fn from(e: InspectEntry) -> Self {
        ImageRecord::new(e.id, e.repo_tags.unwrap_or_default(), e.created)
            .with_digest(e.digest)
            .with_size(e.size)
            .with_labels(e.labels.unwrap_or_default())
    }
}

fn is_not_found(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m))
}

/// Build the `podman pull` argument list for `source`.
fn pull_args(source: &str, opts: &PullOptions) -> Vec<String> {
    let mut args = vec![
        "pull".to_string(),
        format!("--tls-verify={}", opts.registry.tls_verify),
    ];
    if let Some(d) = opts.registry.cert_dir.as_ref() {
        args.push(format!("--cert-dir={d}"));
    }
    if let Some(c) = opts.registry.creds.as_ref() {
        args.push(format!("--creds={}:{}", c.username, c.password));
    }
    if let Some(a) = opts.authfile.as_ref() {
        args.push(format!("--authfile={a}"));
    }
    if let Some(p) = opts.signature_policy.as_ref() {
        args.push(format!("--signature-policy={p}"));
    }
    if opts.quiet {
        args.push("--quiet".into());
    }
    args.push(source.to_string());
    args
}

/// Talks to the local podman image store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodmanStore {
    binary: Utf8PathBuf,
}

impl Default for PodmanStore {
    fn default() -> Self {
        Self::new(DEFAULT_PODMAN)
    }
}

impl PodmanStore {
    /// Use the given podman binary.
    pub fn new(binary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut c = Command::new(&self.binary);
        c.stdin(Stdio::null());
        c
    }

    #[context("Listing images")]
    fn list(&self) -> Result<Vec<ImageRecord>> {
        let entries: Vec<ListEntry> = self
            .command()
            .args(["images", "--format", "json"])
            .run_and_parse_json()?;
        entries.into_iter().map(ImageRecord::try_from).collect()
    }

    fn inspect(&self, reference: &str) -> Result<ImageRecord, StoreError> {
        let output = self
            .command()
            .args(["image", "inspect", "--format", "json", reference])
            .run_capture()?;
        if !output.status.success() && is_not_found(&output.stderr_lossy()) {
            return Err(StoreError::NotFound(reference.to_string()));
        }
        output
            .check_status()
            .with_context(|| format!("Inspecting {reference}"))?;
        let entries: Vec<InspectEntry> = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Parsing inspect output for {reference}"))?;
        entries
            .into_iter()
            .next()
            .map(ImageRecord::from)
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))
    }

    #[context("Pulling {source}")]
    fn pull_impl(&self, source: &str, opts: &PullOptions) -> Result<String> {
        let mut cmd = self.command();
        cmd.args(pull_args(source, opts));
        if !opts.quiet {
            cmd.stderr(Stdio::inherit());
        }
        let output = cmd.log_debug().run_capture()?;
        output.check_status()?;
        let stdout = String::from_utf8(output.stdout).context("Parsing pull output")?;
        // podman prints the image ID; callers want a name they can use
        let id = stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|l| !l.is_empty())
            .with_context(|| format!("No image reported for {source}"))?;
        let image = self.inspect(id)?;
        Ok(image
            .repo_tags
            .into_iter()
            .next()
            .unwrap_or_else(|| id.to_string()))
    }
}

impl ImageStore for PodmanStore {
    fn list_images(&self) -> Result<Vec<ImageRecord>, StoreError> {
        Ok(self.list()?)
    }

    fn resolve_reference(&self, reference: &str) -> Result<ImageRecord, StoreError> {
        self.inspect(reference)
    }

    fn pull(&self, source: &str, opts: &PullOptions) -> Result<String, StoreError> {
        Ok(self.pull_impl(source, opts)?)
    }
}
