//! Stream types for WebSocket subscriptions.

use crate::indicators::timeframe::Timeframe;

/// A kline subscription for one symbol and interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KlineStream {
    pub symbol: String,
    pub interval: Timeframe,
}

impl KlineStream {
    pub fn new(symbol: impl Into<String>, interval: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
        }
    }

    /// Returns the symbol for this stream.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}
