//! MessageParser trait for exchange-specific message handling.

use crate::market::kline::KlineEvent;
use crate::market::streams::KlineStream;

// WebSocketClient owns connection, reconnection and subscription tracking.
// An exchange only supplies endpoints, message formats and parsing.

/// Trait for exchange-specific message parsing and formatting.
pub trait MessageParser: Send + Sync + 'static {
    /// Returns the primary WebSocket endpoint URL.
    fn endpoint(&self) -> &str;

    /// Returns a fallback endpoint URL (if primary fails).
    fn fallback_endpoint(&self) -> Option<&str> {
        None
    }

    // Each exchange has different JSON formats for subscribe/unsubscribe
    fn format_subscribe(&self, stream: &KlineStream) -> String;
    fn format_unsubscribe(&self, stream: &KlineStream) -> String;

    /// Parses an exchange message into a normalized kline event.
    /// Returns None for control messages and anything that is not a kline.
    fn parse_message(&self, msg: &str) -> Option<KlineEvent>;

    fn name(&self) -> &'static str;

    /// Most exchanges have 24h connection limit. Default: 23 hours (safe margin).
    fn max_connection_duration_secs(&self) -> u64 {
        23 * 60 * 60
    }
}
