//! Subscriber setup for hosts embedding the pipeline.
//!
//! The library only emits `tracing` events (one `cycle` span per screening
//! cycle, with structured fields for object ids, risk and propellant). Flight
//! software or a test rig installs a subscriber once, picking the output
//! format from [`Config::log_format`](crate::config::Config::log_format).
//! Verbosity comes from `RUST_LOG`, defaulting to `info`. Output goes to
//! stderr so stdout stays free for decision records.
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines for bench work.
    #[default]
    Text,
    /// JSON lines, for hardware-in-the-loop rigs that ingest decision logs.
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns `false` if one is already set,
/// leaving it in place.
///
/// ```no_run
/// use astria::logging::{self, LogFormat};
///
/// logging::try_init(LogFormat::Json);
/// tracing::info!(cycle = 1, "collision avoidance online");
/// ```
pub fn try_init(format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter());
    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr)
                    .with_thread_ids(true),
            )
            .try_init(),
    };
    installed.is_ok()
}

/// Like [`try_init`], but a second installation is logged instead of ignored.
pub fn init(format: LogFormat) {
    if !try_init(format) {
        tracing::warn!(?format, "subscriber already installed, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        // Only one global subscriber per process
        let _ = try_init(LogFormat::Text);
        assert!(!try_init(LogFormat::Json));
        init(LogFormat::Text);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
