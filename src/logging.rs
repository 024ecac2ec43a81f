use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Initializes the tracing subscriber from the configured log level.
///
/// `RUST_LOG` takes precedence over `log_level` when set. Safe to call more
/// than once; subsequent calls are no-ops.
pub fn init_telemetry(cfg: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    if cfg.log_json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
