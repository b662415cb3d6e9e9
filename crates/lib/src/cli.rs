//! # Commandline parsing
//!
//! Parse the command line, merge it with the optional config file and
//! dispatch to the library.

use std::ffi::OsString;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use fn_error_context::context;
use tempfile::TempPath;

use crate::config::Config;
use crate::images::{self, ListOptions};
use crate::load::{self, LoadOptions};
use crate::podman::{PodmanStore, DEFAULT_PODMAN};
use crate::pull::{self, RegistryPullOpts};
use crate::render::RenderOptions;

/// The default for `load --input`.
const STDIN_PATH: &str = "/dev/stdin";

/// Where a non-seekable stdin is spooled; images may be too large for /tmp.
const STDIN_SPOOL_DIR: &str = "/var/tmp";

/// Options for listing images
#[derive(Debug, Parser, PartialEq, Eq)]
pub struct ImagesOpts {
    /// Display only image IDs
    #[clap(long, short = 'q')]
    pub quiet: bool,

    /// Do not print column headings
    #[clap(long = "noheading", short = 'n', visible_alias = "no-heading")]
    pub no_heading: bool,

    /// Do not truncate output
    #[clap(long)]
    pub no_trunc: bool,

    /// Show digests
    #[clap(long)]
    pub digests: bool,

    /// Change the output format to JSON or a Go-style template
    #[clap(long)]
    pub format: Option<String>,

    /// Filter output based on conditions provided (default [])
    #[clap(long, short = 'f', action = clap::ArgAction::Append)]
    pub filter: Vec<String>,

    /// Only show images whose name or ID matches
    pub image: Option<String>,
}

/// Options for loading an image from an archive or directory
#[derive(Debug, Parser, PartialEq, Eq)]
pub struct LoadOpts {
    /// Read from archive file or directory
    #[clap(long, short = 'i', default_value = STDIN_PATH)]
    pub input: Utf8PathBuf,

    /// Suppress the output
    #[clap(long, short = 'q')]
    pub quiet: bool,

    /// Path to a signature-policy file
    #[clap(long)]
    pub signature_policy: Option<Utf8PathBuf>,

    /// Image to select when the archive holds several
    pub image: Option<String>,
}

/// Options for pulling an image from a registry
#[derive(Debug, Parser, PartialEq, Eq)]
pub struct PullOpts {
    /// Path of the authentication file
    #[clap(long)]
    pub authfile: Option<Utf8PathBuf>,

    /// Path to a directory of certificates for the registry
    #[clap(long)]
    pub cert_dir: Option<Utf8PathBuf>,

    /// Credentials (USERNAME:PASSWORD) to use for authenticating to a registry
    #[clap(long)]
    pub creds: Option<String>,

    /// Suppress output information when pulling images
    #[clap(long, short = 'q')]
    pub quiet: bool,

    /// Path to a signature-policy file
    #[clap(long)]
    pub signature_policy: Option<Utf8PathBuf>,

    /// Require HTTPS and verify certificates when contacting registries (default true)
    #[clap(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub tls_verify: Option<bool>,

    /// The image to pull
    pub image: String,
}

/// Manage local container images.
#[derive(Debug, Parser, PartialEq, Eq)]
#[clap(name = cimg_utils::NAME)]
#[clap(rename_all = "kebab-case")]
#[clap(version)]
pub enum Opt {
    /// List images in local storage
    Images(ImagesOpts),
    /// Load an image from a docker or OCI archive, or a directory
    Load(LoadOpts),
    /// Pull an image from a registry
    Pull(PullOpts),
}

impl From<ImagesOpts> for ListOptions {
    fn from(o: ImagesOpts) -> Self {
        ListOptions {
            filters: o.filter,
            image: o.image,
            render: RenderOptions {
                quiet: o.quiet,
                no_heading: o.no_heading,
                no_trunc: o.no_trunc,
                digests: o.digests,
                format: o.format,
            },
        }
    }
}

impl LoadOpts {
    fn to_load_options(&self, config: &Config) -> LoadOptions {
        LoadOptions {
            quiet: self.quiet,
            signature_policy: self
                .signature_policy
                .clone()
                .or_else(|| config.signature_policy.clone()),
        }
    }
}

impl PullOpts {
    fn to_registry_opts(&self, config: &Config) -> RegistryPullOpts {
        RegistryPullOpts {
            creds: self.creds.clone(),
            cert_dir: self.cert_dir.clone().or_else(|| config.cert_dir.clone()),
            tls_verify: self.tls_verify.or(config.tls_verify).unwrap_or(true),
            authfile: self.authfile.clone().or_else(|| config.authfile.clone()),
            signature_policy: self
                .signature_policy
                .clone()
                .or_else(|| config.signature_policy.clone()),
            quiet: self.quiet,
        }
    }
}

/// Copy `src` into a new temporary file under `dir`, removed on drop.
#[context("Copying input to a temporary file")]
fn spool_to_tempfile(mut src: impl Read, dir: &Utf8Path) -> Result<TempPath> {
    let mut tmp = tempfile::Builder::new()
        .prefix("cimg-load")
        .tempfile_in(dir)
        .with_context(|| format!("Creating temporary file in {dir}"))?;
    let n = std::io::copy(&mut src, &mut tmp)?;
    tmp.flush()?;
    tracing::debug!("Copied {n} bytes to {}", tmp.path().display());
    Ok(tmp.into_temp_path())
}

/// A load source on disk.
#[derive(Debug)]
struct LoadInput {
    path: Utf8PathBuf,
    /// Keeps a spooled copy of stdin alive until the load completes
    _spool: Option<TempPath>,
}

/// Image transports need a path they can open (and possibly reopen), so a
/// piped stdin is spooled to disk first.
fn prepare_input(input: &Utf8Path) -> Result<LoadInput> {
    if input.as_str() != STDIN_PATH {
        return Ok(LoadInput {
            path: input.to_owned(),
            _spool: None,
        });
    }
    let meta = std::fs::metadata(input).with_context(|| format!("Querying {input}"))?;
    if meta.is_file() {
        return Ok(LoadInput {
            path: input.to_owned(),
            _spool: None,
        });
    }
    let spool = spool_to_tempfile(std::io::stdin().lock(), Utf8Path::new(STDIN_SPOOL_DIR))?;
    let path = Utf8PathBuf::try_from(spool.to_path_buf()).context("Non-UTF-8 temporary path")?;
    Ok(LoadInput {
        path,
        _spool: Some(spool),
    })
}

fn store_for(config: &Config) -> PodmanStore {
    PodmanStore::new(
        config
            .podman
            .clone()
            .unwrap_or_else(|| DEFAULT_PODMAN.into()),
    )
}

/// Run the given parsed command.
pub fn run_from_opt(opt: Opt) -> Result<()> {
    let config = Config::load()?;
    let store = store_for(&config);
    match opt {
        Opt::Images(opts) => {
            let stdout = std::io::stdout().lock();
            images::list(&store, &opts.into(), stdout)
        }
        Opt::Load(opts) => {
            let input = prepare_input(&opts.input)?;
            let load_opts = opts.to_load_options(&config);
            let name = load::load_image(
                &store,
                input.path.as_str(),
                opts.image.as_deref(),
                &load_opts,
            )?;
            println!("Loaded image: {name}");
            Ok(())
        }
        Opt::Pull(opts) => {
            let pull_opts = opts.to_registry_opts(&config);
            let outcome = pull::pull_image(&store, &opts.image, &pull_opts)?;
            tracing::debug!("Pulled {}", outcome.name);
            if let Some(id) = outcome.id {
                println!("{id}");
            }
            Ok(())
        }
    }
}

/// Parse the provided arguments and execute.
/// Calls [`clap::Error::exit`] on failure, printing the error message and aborting the program.
pub fn run_from_iter<I>(args: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    run_from_opt(Opt::parse_from(args))
}
