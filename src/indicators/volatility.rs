//! Volatility indicators: True Range (TR), Average True Range (ATR) and Bollinger Bands

use crate::indicators::candle::Candle;
use crate::series::rolling::{dense, rolling_mean, rolling_std};

/// Middle, upper and lower bands plus width, one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub middle: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    /// (upper - lower) / middle * 100
    pub width: Vec<Option<f64>>,
}

/// Calculates the True Range for a single candle.
///
/// True Range is the greatest of:
/// - Current High - Current Low (candle range)
/// - |Current High - Previous Close|
/// - |Current Low - Previous Close|
///
/// For the first candle (no previous close), returns the candle's range.
pub fn true_range(candle: &Candle, prev_close: Option<f64>) -> f64 {
    match prev_close {
        Some(prev) => {
            let high_prev = (candle.get_high() - prev).abs();
            let low_prev = (candle.get_low() - prev).abs();
            candle.range().max(high_prev).max(low_prev)
        }
        None => candle.range(),
    }
}

/// Calculates the Average True Range (ATR) for every row.
///
/// ATR measures market volatility as the rolling mean of True Range over
/// `period` rows. The first `period - 1` rows are `None`.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let ranges: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let prev_close = i.checked_sub(1).map(|p| candles[p].get_close());
            true_range(candle, prev_close)
        })
        .collect();

    rolling_mean(&dense(&ranges), period)
}

/// Bollinger Bands: rolling mean of close ± `std_dev` sample standard deviations.
pub fn bollinger_bands(closes: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let middle = rolling_mean(&dense(closes), period);
    let stds = rolling_std(&dense(closes), period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&stds)
            .map(|(m, s)| Some((*m)? + sign * std_dev * (*s)?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    let width = middle
        .iter()
        .zip(upper.iter().zip(&lower))
        .map(|(m, (u, l))| {
            let m = (*m)?;
            (m != 0.0).then(|| Some(((*u)? - (*l)?) / m * 100.0)).flatten()
        })
        .collect();

    BollingerBands {
        middle,
        upper,
        lower,
        width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candles() -> Vec<Candle> {
        vec![
            Candle::new(0, 100.0, 105.0, 95.0, 102.0, 1000.0),
            Candle::new(60_000, 102.0, 108.0, 100.0, 106.0, 1200.0),
            Candle::new(120_000, 106.0, 110.0, 104.0, 109.0, 1100.0),
        ]
    }

    #[test]
    fn test_true_range_no_previous() {
        let candle = Candle::new(0, 100.0, 110.0, 95.0, 105.0, 1000.0);
        let tr = true_range(&candle, None);
        assert_eq!(tr, 15.0); // 110 - 95
    }

    #[test]
    fn test_true_range_with_previous() {
        let candle = Candle::new(0, 100.0, 110.0, 95.0, 105.0, 1000.0);
        let tr = true_range(&candle, Some(90.0));
        assert_eq!(tr, 20.0); // max(15, |110-90|, |95-90|) = 20
    }

    #[test]
    fn test_atr_insufficient_candles() {
        let atr = atr_series(&sample_candles(), 5);
        assert!(atr.iter().all(Option::is_none));
    }

    #[test]
    fn test_atr_values() {
        let atr = atr_series(&sample_candles(), 3);
        // TR: 10, max(8, 6, 2) = 8, max(6, 4, 2) = 6
        assert_eq!(atr, vec![None, None, Some(8.0)]);
    }

    #[test]
    fn test_bollinger_flat_has_zero_width() {
        let bands = bollinger_bands(&[10.0; 5], 3, 2.0);
        assert_eq!(bands.upper[4], Some(10.0));
        assert_eq!(bands.lower[4], Some(10.0));
        assert_eq!(bands.width[4], Some(0.0));
        assert_eq!(bands.middle[1], None);
    }

    #[test]
    fn test_bollinger_band_ordering() {
        let closes = [10.0, 12.0, 11.0, 14.0, 13.0, 15.0];
        let bands = bollinger_bands(&closes, 3, 2.0);
        for i in 2..closes.len() {
            let (up, mid, low) = (
                bands.upper[i].unwrap(),
                bands.middle[i].unwrap(),
                bands.lower[i].unwrap(),
            );
            assert!(low < mid && mid < up);
        }
    }
}
