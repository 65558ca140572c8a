#![forbid(unsafe_code)]

//! Structured log output for hosts that do not install their own subscriber.
//!
//! Every module logs through `tracing`; without a subscriber the macros are
//! no-ops. With the `tracing-json` feature, [`init_json_logging`] installs a
//! global JSON formatter filtered by `RUST_LOG` (default `info`).

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install a JSON `tracing` subscriber as the global default.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok()
}

#[cfg(all(test, feature = "tracing-json"))]
mod tests {
    use super::*;

    #[test]
    fn second_install_reports_existing_subscriber() {
        // The first call may lose to another global subscriber; either way
        // one is installed afterwards.
        let _ = init_json_logging();
        assert!(!init_json_logging());
        tracing::info!(target: "frankenterm_panes::logging", "json logging active");
    }
}
