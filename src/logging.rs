use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Engine events at info, sqlx query chatter suppressed: a full-scan
/// retrieval pass would otherwise log every statement.
const DEFAULT_FILTER: &str = "info,sqlx=warn";

const LOG_FILE: &str = "groundline.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber with the engine's default
/// filter: stdout plus a daily-rolling `groundline.log` under
/// `log_dir`. `RUST_LOG` overrides the filter.
pub fn init(log_dir: &Path) {
    init_with_filter(log_dir, DEFAULT_FILTER);
}

/// Same as [`init`] but with a host-supplied fallback filter.
pub fn init_with_filter(log_dir: &Path, default_filter: &str) {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_directives_parse() {
        assert!(DEFAULT_FILTER
            .parse::<tracing_subscriber::EnvFilter>()
            .is_ok());
    }
}
