//! Development-time tracing for debugging casegen.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Dev diagnostics via `RUST_LOG`, output to stderr.
//!   Not persisted.
//!
//! - **Transcript (`io/transcript`)**: Every prompt and response exchanged with
//!   the backend, appended to the transcript file. Always written, unaffected
//!   by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,casegen=info";

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to [`DEFAULT_FILTER`] if unset: casegen's
/// own progress at `info`, dependencies (reqwest, hyper) at `warn`.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=casegen=debug casegen code --spec-file cases.yaml --code-files a.go --output-file a_test.go
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
