//! Kline (candlestick) events delivered by the exchange stream.

use crate::indicators::candle::Candle;
use crate::indicators::timeframe::Timeframe;

/// One kline update for a symbol.
///
/// Binance pushes the in-progress candle repeatedly while it forms, then a
/// final update with `is_closed = true`. Consumers that only want finished
/// candles filter on `is_closed`; the analysis window keeps both and upserts
/// by open time.
#[derive(Debug, Clone, PartialEq)]
pub struct KlineEvent {
    pub symbol: String,
    pub interval: Timeframe,
    pub candle: Candle,
    pub is_closed: bool,
}

impl KlineEvent {
    pub fn new(symbol: impl Into<String>, interval: Timeframe, candle: Candle, is_closed: bool) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            candle,
            is_closed,
        }
    }

    pub fn open_time(&self) -> u64 {
        self.candle.get_timestamp()
    }
}
