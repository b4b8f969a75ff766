//! Tracing subscriber setup
//!
//! Filter precedence: `RUST_LOG`, then `LOGLEVEL` (Python-style level names
//! such as `DEBUG` or `WARNING`), then `[logging] level`, then `info`.

use tracing_subscriber::EnvFilter;

/// Level variable honored when `RUST_LOG` is unset
pub const LEGACY_LEVEL_ENV: &str = "LOGLEVEL";

/// Pick the filter directive from the available sources
pub fn filter_directive(rust_log: Option<&str>, legacy_level: Option<&str>, configured: Option<&str>) -> String {
    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(directive) = non_empty(rust_log) {
        return directive.to_string();
    }

    match non_empty(legacy_level).or_else(|| non_empty(configured)) {
        Some(level) => normalize_level(level),
        None => "info".to_string(),
    }
}

fn normalize_level(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Install the global subscriber
pub fn init(configured_level: Option<&str>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let legacy = std::env::var(LEGACY_LEVEL_ENV).ok();
    let directive = filter_directive(rust_log.as_deref(), legacy.as_deref(), configured_level);

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({}), using info", directive, e);
        EnvFilter::new("info")
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        assert_eq!(
            filter_directive(Some("danesfield_pipeline=trace"), Some("DEBUG"), Some("warn")),
            "danesfield_pipeline=trace"
        );
    }

    #[test]
    fn test_legacy_level_before_config() {
        assert_eq!(filter_directive(None, Some("DEBUG"), Some("warn")), "debug");
        assert_eq!(filter_directive(Some("  "), Some("WARNING"), None), "warn");
        assert_eq!(filter_directive(None, Some("CRITICAL"), None), "error");
    }

    #[test]
    fn test_config_then_default() {
        assert_eq!(filter_directive(None, None, Some("Trace")), "trace");
        assert_eq!(filter_directive(None, Some(""), None), "info");
        assert_eq!(filter_directive(None, None, None), "info");
    }
}
