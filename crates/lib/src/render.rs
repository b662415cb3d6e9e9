//! Render a list of images as IDs, JSON, a table or a custom template.
//!
//! The mode is picked by [`OutputFormat::from_options`] with this precedence:
//! an explicit `--format` (either `json` or a template) wins, then `--quiet`
//! (IDs only), then the default table (with a DIGEST column if requested).

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fn_error_context::context;
use serde::Serialize;

use crate::humanize::{human_duration, human_size_with_precision};
use crate::image::{strip_id_prefix, ImageRecord, ID_ALGORITHM_PREFIX};
use crate::template::{align_columns, Field, Template};

/// The `--format` value selecting structured output.
pub const JSON_FORMAT: &str = "json";

/// Length of a truncated image id.
const SHORT_ID_LEN: usize = 12;

/// Significant digits for human-readable sizes.
const SIZE_PRECISION: usize = 3;

/// User choices affecting how images are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Only print image ids.
    pub quiet: bool,
    /// Do not print column headings.
    pub no_heading: bool,
    /// Print full (prefixed) image ids.
    pub no_trunc: bool,
    /// Add a DIGEST column to the default table.
    pub digests: bool,
    /// `json` or a `{{.Field}}` template.
    pub format: Option<String>,
}

/// The resolved output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// One full image id per line.
    Ids,
    /// A JSON array of [`JsonRow`].
    Json,
    /// A `{{.Field}}` template over [`TemplateRow`].
    Template(String),
}

impl OutputFormat {
    /// Pick the output mode; see the module documentation for precedence.
    pub fn from_options(opts: &RenderOptions) -> Self {
        if let Some(format) = opts.format.as_deref().filter(|f| !f.is_empty()) {
            if format == JSON_FORMAT {
                return OutputFormat::Json;
            }
            return OutputFormat::Template(format.to_string());
        }
        if opts.quiet {
            return OutputFormat::Ids;
        }
        let mut format = String::from("table ");
        for field in TemplateRow::table_columns(opts.digests) {
            format.push_str(&format!("{{{{.{}}}}}\t", field.name));
        }
        OutputFormat::Template(format)
    }
}

/// Display strings for one image in the human-readable views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRow {
    /// Repository, empty when dangling
    pub repository: String,
    /// Tag, empty when dangling
    pub tag: String,
    /// Truncated id, or the full id with algorithm prefix
    pub id: String,
    /// Manifest digest
    pub digest: String,
    /// e.g. `3 days ago`
    pub created: String,
    /// e.g. `1.5MB`, empty when unknown
    pub size: String,
}

/// The template vocabulary, in default column order.
///
/// Headers come from [`crate::template::derive_header`], which splits at case
/// changes, so the `ID` column is headed `IMAGE ID` rather than `IMAGEID`.
static TEMPLATE_FIELDS: &[Field<TemplateRow>] = &[
    Field {
        name: "Repository",
        header: None,
        get: |r| &r.repository,
    },
    Field {
        name: "Tag",
        header: None,
        get: |r| &r.tag,
    },
    Field {
        name: "Digest",
        header: None,
        get: |r| &r.digest,
    },
    // Say IMAGE ID, not just ID, so it is not confused with a container id
    Field {
        name: "ID",
        header: Some("ImageID"),
        get: |r| &r.id,
    },
    Field {
        name: "Created",
        header: None,
        get: |r| &r.created,
    },
    Field {
        name: "Size",
        header: None,
        get: |r| &r.size,
    },
];

impl TemplateRow {
    /// Build the display row for `image` as of `now`.
    pub fn new(image: &ImageRecord, no_trunc: bool, now: DateTime<Utc>) -> Self {
        let id = strip_id_prefix(&image.id);
        let id = if no_trunc {
            format!("{ID_ALGORITHM_PREFIX}{id}")
        } else {
            short_id(id).to_string()
        };
        Self {
            repository: image.repository.clone(),
            tag: image.tag.clone(),
            id,
            digest: image.digest.clone(),
            created: format!("{} ago", human_duration(now - image.created)),
            size: image
                .size
                .map(|s| human_size_with_precision(s, SIZE_PRECISION))
                .unwrap_or_default(),
        }
    }

    /// Every substitutable field.
    pub fn fields() -> &'static [Field<TemplateRow>] {
        TEMPLATE_FIELDS
    }

    /// The default table columns.
    pub fn table_columns(digests: bool) -> impl Iterator<Item = &'static Field<TemplateRow>> {
        TEMPLATE_FIELDS
            .iter()
            .filter(move |f| digests || f.name != "Digest")
    }
}

/// The first characters of an id.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

/// Machine-readable form of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonRow {
    /// Full image id
    pub id: String,
    /// All names
    pub names: Vec<String>,
    /// Manifest digest
    pub digest: String,
    /// Creation time (RFC 3339)
    pub created: DateTime<Utc>,
    /// Size in bytes, `null` when unknown
    pub size: Option<u64>,
}

impl From<&ImageRecord> for JsonRow {
    fn from(image: &ImageRecord) -> Self {
        Self {
            id: image.id.clone(),
            names: image.repo_tags.clone(),
            digest: image.digest.clone(),
            created: image.created,
            size: image.size,
        }
    }
}

/// Render `images` to `out`. Nothing is written for an empty list.
pub fn render(images: &[ImageRecord], opts: &RenderOptions, out: impl Write) -> Result<()> {
    render_at(images, opts, Utc::now(), out)
}

/// Like [`render`], with relative times computed from `now`.
#[context("Rendering images")]
pub fn render_at(
    images: &[ImageRecord],
    opts: &RenderOptions,
    now: DateTime<Utc>,
    mut out: impl Write,
) -> Result<()> {
    let format = OutputFormat::from_options(opts);
    // Parse before the empty check so a bad template is always reported
    let template = match &format {
        OutputFormat::Template(t) => Some(Template::parse(t, TemplateRow::fields())?),
        _ => None,
    };
    if images.is_empty() {
        tracing::debug!("No images to render");
        return Ok(());
    }

    if let Some(template) = template {
        let mut lines = Vec::with_capacity(images.len() + 1);
        if template.has_header() && !opts.no_heading {
            lines.push(template.render_header());
        }
        lines.extend(
            images
                .iter()
                .map(|i| template.render(&TemplateRow::new(i, opts.no_trunc, now))),
        );
        for line in align_columns(lines) {
            writeln!(out, "{line}")?;
        }
    } else if format == OutputFormat::Json {
        let rows = images.iter().map(JsonRow::from).collect::<Vec<_>>();
        serde_json::to_writer_pretty(&mut out, &rows).context("Serializing to JSON")?;
        writeln!(out)?;
    } else {
        for image in images {
            writeln!(out, "{}", image.id)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::testutils::{record, sample_catalog, t0};

    fn render_to_string(images: &[ImageRecord], opts: &RenderOptions) -> String {
        let mut buf = Vec::new();
        render_at(images, opts, t0(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn opts_format(format: &str) -> RenderOptions {
        RenderOptions {
            format: Some(format.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_precedence() {
        let default_table = OutputFormat::from_options(&RenderOptions::default());
        assert_eq!(
            default_table,
            OutputFormat::Template(
                "table {{.Repository}}\t{{.Tag}}\t{{.ID}}\t{{.Created}}\t{{.Size}}\t".into()
            )
        );
        let digests = RenderOptions {
            digests: true,
            ..Default::default()
        };
        assert_eq!(
            OutputFormat::from_options(&digests),
            OutputFormat::Template(
                "table {{.Repository}}\t{{.Tag}}\t{{.Digest}}\t{{.ID}}\t{{.Created}}\t{{.Size}}\t"
                    .into()
            )
        );
        // quiet beats the (digest) table
        let quiet = RenderOptions {
            quiet: true,
            digests: true,
            ..Default::default()
        };
        assert_eq!(OutputFormat::from_options(&quiet), OutputFormat::Ids);
        // An explicit format beats quiet
        let custom = RenderOptions {
            quiet: true,
            format: Some("{{.Repository}}".into()),
            ..Default::default()
        };
        assert_eq!(
            OutputFormat::from_options(&custom),
            OutputFormat::Template("{{.Repository}}".into())
        );
        let json = RenderOptions {
            quiet: true,
            format: Some("json".into()),
            ..Default::default()
        };
        assert_eq!(OutputFormat::from_options(&json), OutputFormat::Json);
        // An empty format is no format
        let empty = RenderOptions {
            quiet: true,
            format: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(OutputFormat::from_options(&empty), OutputFormat::Ids);
    }

    #[test]
    fn test_quiet_full_ids() {
        let images = vec![
            record("0123456789abcdef0123", &["x:1"], t0()),
            record("fedcba", &[], t0()),
        ];
        let opts = RenderOptions {
            quiet: true,
            ..Default::default()
        };
        similar_asserts::assert_eq!(
            render_to_string(&images, &opts).as_str(),
            "0123456789abcdef0123\nfedcba\n"
        );
    }

    #[test]
    fn test_custom_format_wins_over_quiet() {
        let opts = RenderOptions {
            quiet: true,
            format: Some("{{.Repository}}:{{.Tag}}".into()),
            ..Default::default()
        };
        let out = render_to_string(&sample_catalog(), &opts);
        similar_asserts::assert_eq!(out.as_str(), "x:latest\n:\n");
    }

    #[test]
    fn test_json_size_never_zero() {
        let out = render_to_string(&sample_catalog(), &opts_format("json"));
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = v.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "a1");
        assert_eq!(rows[0]["names"], serde_json::json!(["x:latest"]));
        assert_eq!(rows[0]["size"], 1_000_000);
        assert_eq!(rows[0]["created"], "2023-11-14T22:13:20Z");
        assert_eq!(rows[1]["id"], "a2");
        assert_eq!(rows[1]["names"], serde_json::json!([]));
        assert!(rows[1]["size"].is_null());
        assert!(rows[1].as_object().unwrap().contains_key("size"));
    }

    #[test]
    fn test_empty_renders_nothing() {
        let modes = [
            RenderOptions::default(),
            RenderOptions {
                quiet: true,
                ..Default::default()
            },
            RenderOptions {
                digests: true,
                ..Default::default()
            },
            opts_format("json"),
            opts_format("table {{.ID}}"),
        ];
        for opts in modes {
            assert_eq!(render_to_string(&[], &opts), "", "{opts:?}");
        }
    }

    #[test]
    fn test_bad_template() {
        let mut buf = Vec::new();
        let err = render_at(&[], &opts_format("{{.Bogus}}"), t0(), &mut buf).unwrap_err();
        assert!(format!("{err:#}").contains("Bogus"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_template_row() {
        let image = record(
            "sha256:0123456789abcdef0123456789",
            &["quay.io/ex/app:v1"],
            t0() - Duration::days(3),
        )
        .with_digest("sha256:feed")
        .with_size(Some(1500));
        let row = TemplateRow::new(&image, false, t0());
        assert_eq!(
            row,
            TemplateRow {
                repository: "quay.io/ex/app".into(),
                tag: "v1".into(),
                id: "0123456789ab".into(),
                digest: "sha256:feed".into(),
                created: "3 days ago".into(),
                size: "1.5kB".into(),
            }
        );
        let row = TemplateRow::new(&image, true, t0());
        assert_eq!(row.id, "sha256:0123456789abcdef0123456789");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_headers_from_schema() {
        let headers = TemplateRow::table_columns(true)
            .map(|f| f.header())
            .collect::<Vec<_>>();
        assert_eq!(
            headers,
            ["REPOSITORY", "TAG", "DIGEST", "IMAGE ID", "CREATED", "SIZE"]
        );
    }

    #[test]
    fn test_dangling_table_scenario() {
        let catalog = sample_catalog();
        let filtered = crate::query::apply(catalog, &[crate::filter::FilterPredicate::Dangling]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a2");

        let out = render_to_string(&filtered, &RenderOptions::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2, "{out}");
        let header = lines[0];
        let row = lines[1];
        assert_eq!(
            header.split_whitespace().collect::<Vec<_>>(),
            ["REPOSITORY", "TAG", "IMAGE", "ID", "CREATED", "SIZE"]
        );
        // Repository and tag are empty: the row starts with the id column
        let id_col = header.find("IMAGE ID").unwrap();
        assert_eq!(row.find("a2").unwrap(), id_col);
        assert!(row[..id_col].trim().is_empty());
        let created_col = header.find("CREATED").unwrap();
        assert_eq!(&row[created_col..], "About an hour ago");
    }

    #[test]
    fn test_no_heading() {
        let opts = RenderOptions {
            no_heading: true,
            ..Default::default()
        };
        let out = render_to_string(&sample_catalog(), &opts);
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("x "));
        assert!(!out.contains("REPOSITORY"));

        // Also applies to custom table templates
        let opts = RenderOptions {
            no_heading: true,
            format: Some("table {{.ID}}".into()),
            ..Default::default()
        };
        let out = render_to_string(&sample_catalog(), &opts);
        similar_asserts::assert_eq!(out.as_str(), "a1\na2\n");
    }

    #[test]
    fn test_custom_table_with_tab_escape() {
        let out = render_to_string(&sample_catalog(), &opts_format(r"table {{.ID}}\t{{.Size}}"));
        let expected = indoc::indoc! {"
            IMAGE ID   SIZE
            a1         1MB
            a2
        "};
        similar_asserts::assert_eq!(out.as_str(), expected);
    }
}
