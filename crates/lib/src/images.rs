//! The image listing pipeline: snapshot, filter, render.

use std::io::Write;

use anyhow::Result;
use fn_error_context::context;

use crate::error::ImageError;
use crate::filter;
use crate::query;
use crate::render::{self, RenderOptions};
use crate::store::ImageStore;

/// Options for [`list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// `--filter` expressions, all of which must hold.
    pub filters: Vec<String>,
    /// Free-text search term.
    pub image: Option<String>,
    /// Output selection.
    pub render: RenderOptions,
}

/// List the images in `store` matching `opts`, writing them to `out`.
#[context("Listing images")]
pub fn list(store: &dyn ImageStore, opts: &ListOptions, out: impl Write) -> Result<()> {
    let images = store.list_images().map_err(|source| ImageError::Store {
        context: "Reading image catalog".into(),
        source,
    })?;
    let predicates = filter::compile(store, &opts.filters, opts.image.as_deref())?;
    let images = query::apply(images, &predicates);
    tracing::debug!("{} images after filtering", images.len());
    render::render(&images, &opts.render, out)
}
