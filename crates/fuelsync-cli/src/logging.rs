use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

const DEFAULT_FILTER: &str = "info";

/// Pick the log filter: `--log-level`, then `RUST_LOG`, then the config
/// file's level, then `info`.
pub fn resolve_filter(
    flag: Option<LogLevel>,
    rust_log: Option<String>,
    config_level: Option<&str>,
) -> String {
    if let Some(level) = flag {
        return level.filter_name().to_string();
    }
    if let Some(filter) = rust_log.filter(|value| !value.trim().is_empty()) {
        return filter;
    }
    config_level
        .and_then(LogLevel::from_config_name)
        .map_or(DEFAULT_FILTER, LogLevel::filter_name)
        .to_string()
}

pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
