//! Bounded rolling buffer of the most recent candles.

use std::collections::VecDeque;

use crate::indicators::candle::Candle;
use crate::market::kline::KlineEvent;
use crate::series::Series;

/// What an upsert did with the incoming candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Appended,
    /// Same open time as the newest candle (still forming).
    Replaced,
    /// Older than the newest candle.
    Ignored,
}

/// Keeps at most `capacity` candles ordered by strictly increasing open time.
#[derive(Debug, Clone)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a window from history, keeping only the newest `capacity`
    /// candles that arrive in increasing order.
    pub fn from_history(capacity: usize, history: impl IntoIterator<Item = Candle>) -> Self {
        let mut window = Self::new(capacity);
        for candle in history {
            window.upsert(candle);
        }
        window
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn upsert(&mut self, candle: Candle) -> Upsert {
        let outcome = match self.candles.back() {
            Some(last) if candle.get_timestamp() < last.get_timestamp() => return Upsert::Ignored,
            Some(last) if candle.get_timestamp() == last.get_timestamp() => {
                self.candles.pop_back();
                Upsert::Replaced
            }
            _ => Upsert::Appended,
        };

        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
        outcome
    }

    pub fn apply(&mut self, event: &KlineEvent) -> Upsert {
        self.upsert(event.candle)
    }

    /// Snapshot of the window for analysis.
    pub fn to_series(&self) -> Series {
        Series::new(self.candles.iter().copied().collect())
    }
}
