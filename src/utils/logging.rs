use std::str::FromStr;

use tracing::Level;

use crate::config::LoggingSettings;

/// Parses a level name, falling back to `INFO` for anything unrecognised.
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "warning" => Level::WARN,
        other => Level::from_str(other).unwrap_or(Level::INFO),
    }
}

/// Installs the global `tracing` subscriber described by `settings`.
///
/// `format = "json"` emits one JSON object per event; anything else uses
/// the human-readable formatter. Later calls are no-ops, so tests may call
/// this freely.
pub fn init(settings: &LoggingSettings) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(parse_level(&settings.level))
        .with_target(false);

    let _ = if settings.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
