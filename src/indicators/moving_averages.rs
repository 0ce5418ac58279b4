//! Moving Average indicators: Simple Moving Average (SMA) and Exponential Moving Average (EMA)

use crate::series::rolling::{dense, rolling_mean};

/// Calculates the Simple Moving Average (SMA) for every row.
///
/// SMA = (C1 + C2 + ... + Cn) / n
///
/// Row `i` averages the `period` values ending at `i`. The first
/// `period - 1` rows are `None`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&dense(values), period)
}

/// Calculates the Exponential Moving Average (EMA) for every row.
///
/// EMA = Value * multiplier + EMA_prev * (1 - multiplier)
/// where multiplier = 2 / (span + 1)
///
/// The recursion is seeded with the first value itself, so every row has an
/// EMA. Early rows lean heavily on the seed.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let multiplier = 2.0 / (span as f64 + 1.0);
    let mut ema_values = Vec::with_capacity(values.len());

    for &value in values {
        let next = match ema_values.last() {
            Some(prev) => value * multiplier + prev * (1.0 - multiplier),
            None => value,
        };
        ema_values.push(next);
    }

    ema_values
}
