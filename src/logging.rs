//! Logging setup for Lexi
//!
//! Logs go to stderr so they never interleave with the chat transcript on
//! stdout. `RUST_LOG` takes precedence over the verbosity flag.

use crate::error::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "lexi=debug"
    } else {
        "lexi=info"
    }
}

/// Initialize the global tracing subscriber
///
/// # Arguments
///
/// * `verbose` - Raise the default level to debug
/// * `json` - Emit JSON lines instead of human-readable output
///
/// # Errors
///
/// Returns error if the filter directive cannot be parsed
///
/// # Examples
///
/// ```no_run
/// use lexi::logging::init_logging;
///
/// init_logging(false, false).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
