//! Compile `--filter` expressions and the free-text image argument into
//! predicates over [`ImageRecord`].
//!
//! Supported expressions:
//!
//! | expression | matches |
//! |---|---|
//! | `before=REF` | images created strictly before the image `REF` |
//! | `after=REF` | images created strictly after the image `REF` |
//! | `dangling` / `dangling=...` | images without any name |
//! | `label=KEY=VALUE` | images whose label `KEY` is exactly `VALUE` |
//! | `label=KEY` | images that have a label `KEY`, whatever its value |
//!
//! The free-text term matches when it is a substring of the repository or
//! of any name, or a prefix of the image id (with or without `sha256:`).
//! Matching is case-sensitive.

use chrono::{DateTime, Utc};

use crate::error::ImageError;
use crate::image::{strip_id_prefix, ImageRecord};
use crate::store::ImageStore;

/// A single pure test over an image; see the module docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPredicate {
    /// Created strictly before this time.
    Before(DateTime<Utc>),
    /// Created strictly after this time.
    After(DateTime<Utc>),
    /// Has no names.
    Dangling,
    /// Has the label; with a value, the value must match exactly.
    Label {
        /// Label key
        key: String,
        /// Required value, or `None` for presence only
        value: Option<String>,
    },
    /// Free-text search term.
    FreeText(String),
}

impl FilterPredicate {
    /// Evaluate this predicate against an image.
    pub fn matches(&self, image: &ImageRecord) -> bool {
        match self {
            FilterPredicate::Before(t) => image.created < *t,
            FilterPredicate::After(t) => image.created > *t,
            FilterPredicate::Dangling => image.is_dangling(),
            FilterPredicate::Label { key, value } => match (image.labels.get(key), value) {
                (Some(v), Some(want)) => v == want,
                (Some(_), None) => true,
                (None, _) => false,
            },
            FilterPredicate::FreeText(term) => {
                image.repository.contains(term.as_str())
                    || image.repo_tags.iter().any(|t| t.contains(term.as_str()))
                    || image.id.starts_with(strip_id_prefix(term))
            }
        }
    }
}

/// Resolve `reference` through the store and return its creation time.
fn created_time_of(store: &dyn ImageStore, reference: &str) -> Result<DateTime<Utc>, ImageError> {
    match store.resolve_reference(reference) {
        Ok(image) => Ok(image.created),
        Err(e) if e.is_not_found() => Err(ImageError::UnresolvableReference {
            reference: reference.to_string(),
            source: e,
        }),
        Err(e) => Err(ImageError::Store {
            context: format!("resolving image {reference:?}"),
            source: e,
        }),
    }
}

/// Compile one `key[=value]` expression.
fn compile_one(store: &dyn ImageStore, expr: &str) -> Result<FilterPredicate, ImageError> {
    let (key, value) = match expr.split_once('=') {
        Some((k, v)) => (k, Some(v)),
        None => (expr, None),
    };
    let require_value = || {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ImageError::InvalidFilterValue(expr.to_string()))
    };
    let r = match key {
        "before" => FilterPredicate::Before(created_time_of(store, require_value()?)?),
        "after" => FilterPredicate::After(created_time_of(store, require_value()?)?),
        "dangling" => FilterPredicate::Dangling,
        "label" => {
            let selector = require_value()?;
            let (key, value) = match selector.split_once('=') {
                Some((k, v)) => (k, Some(v.to_string())),
                None => (selector, None),
            };
            if key.is_empty() {
                return Err(ImageError::InvalidFilterValue(expr.to_string()));
            }
            FilterPredicate::Label {
                key: key.to_string(),
                value,
            }
        }
        other => return Err(ImageError::UnknownFilterKey(other.to_string())),
    };
    Ok(r)
}

/// Compile filter expressions plus an optional free-text term.
///
/// Compilation stops at the first invalid expression; on error no predicates
/// are returned. The free-text predicate, if any, comes last.
pub fn compile<S: AsRef<str>>(
    store: &dyn ImageStore,
    expressions: &[S],
    free_text: Option<&str>,
) -> Result<Vec<FilterPredicate>, ImageError> {
    let mut predicates = expressions
        .iter()
        .map(|e| compile_one(store, e.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(term) = free_text.map(str::trim).filter(|t| !t.is_empty()) {
        predicates.push(FilterPredicate::FreeText(term.to_string()));
    }
    tracing::debug!("Compiled {} image filters", predicates.len());
    Ok(predicates)
}
