//! The main entrypoint for cimg, which just performs global initialization, and then
//! calls out into the library.
use anyhow::Result;

fn run() -> Result<()> {
    cimg_utils::initialize_tracing();
    tracing::trace!("starting {}", env!("CARGO_PKG_NAME"));
    cimg_lib::cli::run_from_iter(std::env::args_os())
}

fn main() {
    cimg_utils::run_main(run)
}
