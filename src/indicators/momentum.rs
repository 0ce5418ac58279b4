//! Momentum indicators: RSI, MACD, Stochastic, Money Flow Index and On-Balance Volume

use crate::indicators::candle::Candle;
use crate::indicators::moving_averages::ema_series;
use crate::series::rolling::{dense, rolling_max, rolling_mean, rolling_min, rolling_sum};

/// MACD line, its signal line and the histogram, one value per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Calculates the Relative Strength Index (RSI) for every row.
///
/// RSI is a momentum oscillator that measures the speed and magnitude of price changes.
/// It oscillates between 0 and 100.
///
/// RSI = 100 - (100 / (1 + RS))
/// where RS = Average Gain / Average Loss over the trailing `period` rows
///
/// Averages are plain rolling means, not Wilder smoothing. The first row
/// counts as a zero change, so values start at row `period - 1`.
///
/// Common interpretation:
/// - RSI > 70: Overbought (potential sell signal)
/// - RSI < 30: Oversold (potential buy signal)
///
/// No losses with some gains gives 100. No movement at all gives `None`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let changes = price_changes(closes);
    let (gains, losses) = gains_and_losses(&changes);

    let avg_gains = rolling_mean(&dense(&gains), period);
    let avg_losses = rolling_mean(&dense(&losses), period);

    avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(gain, loss)| ratio_index((*gain)?, (*loss)?))
        .collect()
}

/// MACD = EMA(fast) - EMA(slow), signal = EMA(signal_span) of MACD.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast = ema_series(closes, fast);
    let slow = ema_series(closes, slow);
    let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_series(&macd, signal_span);
    let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Macd {
        macd,
        signal,
        histogram,
    }
}

/// Stochastic %K = (Close - Lowest Low) / (Highest High - Lowest Low) * 100
///
/// `None` until `period` rows exist, and on a window with zero range.
pub fn stochastic_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let lows: Vec<f64> = candles.iter().map(|c| c.get_low()).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.get_high()).collect();
    let lowest = rolling_min(&dense(&lows), period);
    let highest = rolling_max(&dense(&highs), period);

    candles
        .iter()
        .zip(lowest.iter().zip(&highest))
        .map(|(candle, (low, high))| {
            let (low, high) = ((*low)?, (*high)?);
            let range = high - low;
            (range > 0.0).then(|| (candle.get_close() - low) / range * 100.0)
        })
        .collect()
}

/// Money Flow Index over the trailing `period` rows.
///
/// Money flow = typical price * volume. A row's flow counts as positive when
/// its typical price rose from the previous row and negative when it fell.
/// MFI = 100 - 100 / (1 + positive / negative).
pub fn mfi_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let typical: Vec<f64> = candles.iter().map(Candle::typical_price).collect();

    let mut positive = vec![0.0; candles.len()];
    let mut negative = vec![0.0; candles.len()];
    for i in 1..candles.len() {
        let flow = typical[i] * candles[i].get_volume();
        if typical[i] > typical[i - 1] {
            positive[i] = flow;
        } else if typical[i] < typical[i - 1] {
            negative[i] = flow;
        }
    }

    let positive = rolling_sum(&dense(&positive), period);
    let negative = rolling_sum(&dense(&negative), period);

    positive
        .iter()
        .zip(&negative)
        .map(|(pos, neg)| ratio_index((*pos)?, (*neg)?))
        .collect()
}

/// On-Balance Volume: running sum of volume signed by the close direction.
///
/// The first row is 0; unchanged closes add nothing.
pub fn obv_series(candles: &[Candle]) -> Vec<f64> {
    let mut total = 0.0;
    let mut obv = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        if i > 0 {
            let change = candle.get_close() - candles[i - 1].get_close();
            if change > 0.0 {
                total += candle.get_volume();
            } else if change < 0.0 {
                total -= candle.get_volume();
            }
        }
        obv.push(total);
    }
    obv
}

/// `100 - 100 / (1 + up / down)`, shared by RSI and MFI.
fn ratio_index(up: f64, down: f64) -> Option<f64> {
    if down == 0.0 {
        return (up > 0.0).then_some(100.0);
    }
    Some(100.0 - (100.0 / (1.0 + up / down)))
}

/// Calculates price changes between consecutive closes.
///
/// The first row has no predecessor and counts as a zero change, so the
/// output has one value per input row.
fn price_changes(closes: &[f64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return changes;
    }
    changes.push(0.0);
    changes.extend(closes.windows(2).map(|pair| pair[1] - pair[0]));
    changes
}

/// Separates price changes into gains and losses.
///
/// Returns a tuple of (gains, losses) where:
/// - gains[i] = change if positive, else 0
/// - losses[i] = |change| if negative, else 0
fn gains_and_losses(changes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let gains: Vec<f64> = changes.iter().map(|&c| if c > 0.0 { c } else { 0.0 }).collect();

    let losses: Vec<f64> = changes
        .iter()
        .map(|&c| if c < 0.0 { c.abs() } else { 0.0 })
        .collect();

    (gains, losses)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Closes: 100, 102, 105, 108, 112, 116, 120, 125, 130, 136, 142, 148, 155, 162, 170
    const UPTREND: [f64; 15] = [
        100.0, 102.0, 105.0, 108.0, 112.0, 116.0, 120.0, 125.0, 130.0, 136.0, 142.0, 148.0, 155.0,
        162.0, 170.0,
    ];

    // Closes: 170, 165, 160, 154, 148, 142, 135, 128, 121, 114, 107, 100, 93, 86, 80
    const DOWNTREND: [f64; 15] = [
        170.0, 165.0, 160.0, 154.0, 148.0, 142.0, 135.0, 128.0, 121.0, 114.0, 107.0, 100.0, 93.0,
        86.0, 80.0,
    ];

    // Sideways: 100, 102, 100, 103, 101, 104, 102, 105, 103, 106, 104, 107, 105, 108, 106
    const SIDEWAYS: [f64; 15] = [
        100.0, 102.0, 100.0, 103.0, 101.0, 104.0, 102.0, 105.0, 103.0, 106.0, 104.0, 107.0, 105.0,
        108.0, 106.0,
    ];

    fn candles_from(rows: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close, volume))| {
                Candle::new(i as u64 * 60_000, close, high, low, close, volume)
            })
            .collect()
    }

    #[test]
    fn test_rsi_pure_uptrend_is_100() {
        let rsi = rsi_series(&UPTREND, 14);
        assert_eq!(rsi[14], Some(100.0));
    }

    #[test]
    fn test_rsi_oversold() {
        let rsi = rsi_series(&DOWNTREND, 14);
        let last = rsi.last().copied().flatten().unwrap();
        // Strong downtrend should result in RSI < 30 (oversold)
        assert!(last < 30.0, "RSI ({}) should be < 30 for strong downtrend", last);
    }

    #[test]
    fn test_rsi_neutral() {
        let rsi = rsi_series(&SIDEWAYS, 14);
        let last = rsi.last().copied().flatten().unwrap();
        assert!(
            last > 30.0 && last < 70.0,
            "RSI ({}) should be between 30 and 70 for sideways movement",
            last
        );
    }

    #[test]
    fn test_rsi_starts_at_period_minus_one() {
        let rsi = rsi_series(&SIDEWAYS, 5);
        assert!(rsi[..4].iter().all(Option::is_none));
        assert!(rsi[4..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_flat_is_undefined() {
        let rsi = rsi_series(&[50.0; 20], 14);
        assert!(rsi.iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_bounds() {
        for closes in [UPTREND, DOWNTREND, SIDEWAYS] {
            for value in rsi_series(&closes, 5).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_price_changes() {
        let changes = price_changes(&[100.0, 105.0, 103.0]);
        assert_eq!(changes, vec![0.0, 5.0, -2.0]);
        assert!(price_changes(&[]).is_empty());
    }

    #[test]
    fn test_gains_and_losses() {
        let changes = vec![5.0, -3.0, 2.0, -1.0, 4.0];
        let (gains, losses) = gains_and_losses(&changes);

        assert_eq!(gains, vec![5.0, 0.0, 2.0, 0.0, 4.0]);
        assert_eq!(losses, vec![0.0, 3.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let macd = macd_series(&UPTREND, 12, 26, 9);
        assert_eq!(macd.macd[0], 0.0);
        assert!(*macd.macd.last().unwrap() > 0.0);
        let last = UPTREND.len() - 1;
        assert_eq!(macd.histogram[last], macd.macd[last] - macd.signal[last]);
    }

    #[test]
    fn test_stochastic_at_window_high() {
        let candles = candles_from(&[
            (11.0, 9.0, 10.0, 1.0),
            (12.0, 10.0, 11.0, 1.0),
            (15.0, 11.0, 15.0, 1.0),
        ]);
        let stoch = stochastic_series(&candles, 3);
        assert_eq!(stoch, vec![None, None, Some(100.0)]);
    }

    #[test]
    fn test_stochastic_zero_range() {
        let candles = candles_from(&[(10.0, 10.0, 10.0, 1.0); 4]);
        assert!(stochastic_series(&candles, 3).iter().all(Option::is_none));
    }

    #[test]
    fn test_mfi_all_positive_flow() {
        let candles = candles_from(&[
            (11.0, 9.0, 10.0, 100.0),
            (12.0, 10.0, 11.0, 100.0),
            (13.0, 11.0, 12.0, 100.0),
            (14.0, 12.0, 13.0, 100.0),
        ]);
        let mfi = mfi_series(&candles, 3);
        assert_eq!(mfi, vec![None, None, Some(100.0), Some(100.0)]);
    }

    #[test]
    fn test_obv_accumulates_signed_volume() {
        let candles = candles_from(&[
            (11.0, 9.0, 10.0, 100.0),
            (12.0, 10.0, 11.0, 200.0),
            (12.0, 10.0, 11.0, 50.0),
            (11.0, 8.0, 9.0, 70.0),
        ]);
        assert_eq!(obv_series(&candles), vec![0.0, 200.0, 200.0, 130.0]);
    }
}
