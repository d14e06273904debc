//! Diagnostic logging for the binary.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here picks those records up. Run output (progress, warnings about
//! sheets) goes through the batch reporter instead.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` overrides the default level (`warn`, or `debug` with
/// `--verbose`), e.g. `RUST_LOG=cubefill_report=debug`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(verbose)
        .try_init();
}
