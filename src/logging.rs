//! `tracing-subscriber` setup for binaries and tools embedding the engine.
//!
//! The library itself only emits `tracing` events; nothing is printed unless a subscriber
//! is installed, e.g. with [`init`].

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Either a simple level like "info" or a full EnvFilter string
    /// e.g. "info,tabload=debug". `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit logs as JSON lines when true; otherwise plain text.
    pub json: bool,
    /// Include the event target (module path) in logs.
    pub with_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
            with_targets: false,
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(cfg: &LogConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if cfg.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cfg.with_targets)
            .json()
            .with_current_span(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cfg.with_targets)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    let _ = INIT.set(());
    Ok(())
}
