//! Process-level plumbing shared by the `cimg` crates: running child
//! commands, logging setup and the `main` error reporter.
//!
//! Nothing in here knows about images.

mod command;
pub use command::*;
mod tracing_util;
pub use tracing_util::*;

/// The name of our binary
pub const NAME: &str = "cimg";

/// Render a top-level error with its full context chain.
fn error_report(e: &anyhow::Error) -> String {
    use owo_colors::OwoColorize;

    format!("{}{e:#}", "error: ".red())
}

/// Run `f` as the body of `main`. A failure is reported on stderr with its
/// context chain and the process exits with status 1.
pub fn run_main<F>(f: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    use std::io::Write as _;

    let Err(e) = f() else {
        return;
    };
    // stderr may already be gone; the exit status still reports failure
    let _ = writeln!(anstream::stderr(), "{}", error_report(&e));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use anyhow::Context as _;

    use super::*;

    #[test]
    fn error_report_includes_context_chain() {
        let e = std::fs::read("/nonexistent/cimg-config.toml")
            .context("Loading configuration")
            .unwrap_err();
        let report = error_report(&e);
        assert!(report.contains("error: "), "{report}");
        assert!(
            report.contains("Loading configuration: "),
            "{report}"
        );
        assert!(report.ends_with("(os error 2)"), "{report}");
    }

    #[test]
    fn run_main_ok_returns() {
        run_main(|| Ok(()));
    }
}
