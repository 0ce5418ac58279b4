//! Candle (OHLCV) data structure with timestamp

use serde::{Deserialize, Serialize};

/// Represents a single candlestick with OHLCV data and timestamp.
///
/// The timestamp is stored as Unix time in milliseconds, which is the format
/// Binance uses for kline open times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds (candle open time)
    timestamp: u64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Candle {
    /// Creates a new Candle.
    ///
    /// `timestamp` should be Unix time in milliseconds (candle open time).
    pub fn new(
        timestamp: u64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        debug_assert!(high >= low, "candle high must be >= low");
        debug_assert!(open >= low && open <= high, "candle open must be within [low, high]");
        debug_assert!(close >= low && close <= high, "candle close must be within [low, high]");

        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the candle's timestamp (Unix time in milliseconds).
    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_open(&self) -> f64 {
        self.open
    }

    pub fn get_high(&self) -> f64 {
        self.high
    }

    pub fn get_low(&self) -> f64 {
        self.low
    }

    pub fn get_close(&self) -> f64 {
        self.close
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }

    /// Returns the full range of the candle (high - low).
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the typical price (high + low + close) / 3, the basis of money flow.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}
