//! Helpers intended for [`std::process::Command`].

use std::process::{Command, Output};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Options whose values are secrets and never appear in logged command lines.
const SECRET_FLAGS: &[&str] = &["--creds", "--password"];

const REDACTED: &str = "<redacted>";

/// The secret flag `arg` sets, either as `--flag` or `--flag=value`.
fn secret_flag(arg: &str) -> Option<&'static str> {
    SECRET_FLAGS.iter().copied().find(|f| {
        arg.strip_prefix(f)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('='))
    })
}

/// Helpers intended for [`std::process::Command`].
pub trait CommandRunExt {
    /// Log (at debug level) the full child commandline.
    fn log_debug(&mut self) -> &mut Self;

    /// Execute the child process, capturing stdout and stderr. A non-zero
    /// exit status is not an error here; see [`CommandOutputExt`].
    fn run_capture(&mut self) -> Result<Output>;

    /// Execute the child process and return its stdout as a string.
    /// A non-zero exit status is an error carrying the child's stderr.
    fn run_get_string(&mut self) -> Result<String>;

    /// Execute the child process, parsing its stdout as JSON.
    fn run_and_parse_json<T: DeserializeOwned>(&mut self) -> Result<T>;

    /// Render the command line, quoted for a shell, with the values of
    /// secret options such as `--creds` replaced.
    fn to_string_pretty(&self) -> String;
}

/// Helpers for the result of [`CommandRunExt::run_capture`].
pub trait CommandOutputExt {
    /// Convert a non-zero exit status into an error containing stderr.
    fn check_status(&self) -> Result<()>;

    /// The child's stderr, lossily decoded and trimmed.
    fn stderr_lossy(&self) -> String;
}

impl CommandOutputExt for Output {
    fn check_status(&self) -> Result<()> {
        if self.status.success() {
            return Ok(());
        }
        let stderr = self.stderr_lossy();
        if stderr.is_empty() {
            anyhow::bail!("Subprocess failed: {:?}", self.status)
        }
        anyhow::bail!("Subprocess failed: {:?}\n{stderr}", self.status)
    }

    fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

impl CommandRunExt for Command {
    fn log_debug(&mut self) -> &mut Self {
        // We unconditionally log at trace level, so avoid double logging
        if !tracing::enabled!(tracing::Level::TRACE) {
            tracing::debug!("exec: {}", self.to_string_pretty());
        }
        self
    }

    fn run_capture(&mut self) -> Result<Output> {
        tracing::trace!("exec: {}", self.to_string_pretty());
        let program = self.get_program().to_string_lossy().into_owned();
        self.output().with_context(|| format!("Spawning {program}"))
    }

    fn run_get_string(&mut self) -> Result<String> {
        let output = self.run_capture()?;
        output.check_status()?;
        String::from_utf8(output.stdout).context("Subprocess output was not UTF-8")
    }

    fn run_and_parse_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let output = self.run_capture()?;
        output.check_status()?;
        serde_json::from_slice(&output.stdout).context("Parsing subprocess output as JSON")
    }

    fn to_string_pretty(&self) -> String {
        let mut redact_next = false;
        std::iter::once(self.get_program())
            .chain(self.get_args())
            .map(|arg| {
                let arg = arg.to_string_lossy();
                let arg = if std::mem::take(&mut redact_next) {
                    REDACTED.into()
                } else if let Some(flag) = secret_flag(&arg) {
                    if arg.len() == flag.len() {
                        redact_next = true;
                        arg
                    } else {
                        format!("{flag}={REDACTED}").into()
                    }
                } else {
                    arg
                };
                shlex::try_quote(&arg)
                    .map(|q| q.into_owned())
                    .unwrap_or_else(|_| arg.into_owned())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
