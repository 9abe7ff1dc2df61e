//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; those records are
//! forwarded into the tracing subscriber installed here.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Install the global subscriber.
///
/// `RUST_LOG` sets the filter. `LOG_FORMAT=json` switches to one JSON
/// object per line for log shippers; anything else prints human-readable
/// lines with source locations.
///
/// ```no_run
/// p9_server::logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = wants_json(std::env::var("LOG_FORMAT").ok().as_deref());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::debug!(json, "Logging initialized");
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}

/// Log a finished websocket session with its table and player.
pub fn log_session_closed(table: &str, player_id: Option<&str>, messages: u64) {
    tracing::info!(
        table = table,
        player_id = player_id,
        messages = messages,
        "WebSocket session closed"
    );
}

/// Log a rejected action at debug level; these are routine game rule refusals.
pub fn log_rejected_action(table: &str, action: &str, reason: &str) {
    tracing::debug!(
        table = table,
        action = action,
        reason = reason,
        "Action rejected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_format_selection() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some(" JSON ")));
        assert!(!wants_json(Some("pretty")));
        assert!(!wants_json(None));
    }

    #[test]
    fn test_log_helpers_without_subscriber() {
        log_session_closed("sunday", Some("abc"), 3);
        log_session_closed("sunday", None, 0);
        log_rejected_action("sunday", "draw_from_draw", "Not your turn");
    }
}
