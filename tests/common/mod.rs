#![allow(dead_code)]

use market_sentinel::{Candle, Series};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One-minute candles with the given closes and volumes. Each candle opens at
/// the previous close and its wicks sit just outside the body.
pub fn series_from(closes: &[f64], volumes: &[f64]) -> Series {
    assert_eq!(closes.len(), volumes.len());
    let mut prev = closes.first().copied().unwrap_or_default();
    let candles = closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = prev;
            prev = close;
            Candle::new(
                1_700_000_000_000 + i as u64 * 60_000,
                open,
                open.max(close) * 1.001,
                open.min(close) * 0.999,
                close,
                volume,
            )
        })
        .collect();
    Series::new(candles)
}

pub fn flat_series(rows: usize, close: f64) -> Series {
    series_from(&vec![close; rows], &vec![1_000.0; rows])
}

/// Seeded random walk with mild noise in close and volume.
pub fn random_walk(rows: usize, seed: u64) -> Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = 100.0;
    let mut closes = Vec::with_capacity(rows);
    let mut volumes = Vec::with_capacity(rows);
    for _ in 0..rows {
        close *= 1.0 + rng.gen_range(-0.005..0.005);
        closes.push(close);
        volumes.push(rng.gen_range(800.0..1_200.0));
    }
    series_from(&closes, &volumes)
}
