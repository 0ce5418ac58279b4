//! Full indicator table for the dashboard and the signal scorer.

use tracing::debug;

use crate::config::IndicatorConfig;
use crate::error::Result;
use crate::indicators::momentum::{macd_series, mfi_series, obv_series, rsi_series, stochastic_series};
use crate::indicators::moving_averages::{ema_series, sma_series};
use crate::indicators::volatility::{atr_series, bollinger_bands};
use crate::series::rolling::dense;
use crate::series::{Column, Series};

/// Adds every technical indicator column to a copy of `series`.
///
/// Short series are fine: rows without enough history are `None`, so a
/// 30-row series simply has no `sma_50` or `sma_200` values.
pub fn compute_indicators(series: &Series, config: &IndicatorConfig) -> Result<Series> {
    config.validate()?;

    let candles = series.candles();
    let closes = series.closes();
    let macd = macd_series(&closes, config.ema_fast, config.ema_slow, config.macd_signal);
    let bands = bollinger_bands(&closes, config.bollinger_period, config.bollinger_std_dev);

    let mut out = series.clone();
    out.set_column(Column::Sma20, sma_series(&closes, config.sma_short));
    out.set_column(Column::Sma50, sma_series(&closes, config.sma_long));
    out.set_column(Column::Sma200, sma_series(&closes, config.sma_extra_long));
    out.set_column(Column::Ema12, dense(&ema_series(&closes, config.ema_fast)));
    out.set_column(Column::Ema26, dense(&ema_series(&closes, config.ema_slow)));
    out.set_column(Column::Macd, dense(&macd.macd));
    out.set_column(Column::MacdSignal, dense(&macd.signal));
    out.set_column(Column::MacdHistogram, dense(&macd.histogram));
    out.set_column(Column::Rsi, rsi_series(&closes, config.rsi_period));
    out.set_column(Column::BbMiddle, bands.middle);
    out.set_column(Column::BbUpper, bands.upper);
    out.set_column(Column::BbLower, bands.lower);
    out.set_column(Column::BbWidth, bands.width);
    out.set_column(Column::Stochastic, stochastic_series(candles, config.stochastic_period));
    out.set_column(Column::Atr, atr_series(candles, config.atr_period));
    out.set_column(Column::Obv, dense(&obv_series(candles)));
    out.set_column(Column::Mfi, mfi_series(candles, config.mfi_period));

    debug!(rows = out.len(), "technical indicators computed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::fixtures::wavy_series;

    #[test]
    fn test_all_columns_aligned() {
        let series = compute_indicators(&wavy_series(60), &IndicatorConfig::default()).unwrap();
        for column in [
            Column::Sma20,
            Column::Sma200,
            Column::Macd,
            Column::Rsi,
            Column::BbWidth,
            Column::Stochastic,
            Column::Atr,
            Column::Obv,
            Column::Mfi,
        ] {
            assert_eq!(series.require(column).unwrap().len(), 60, "{column}");
        }
    }

    #[test]
    fn test_history_requirements() {
        let series = compute_indicators(&wavy_series(60), &IndicatorConfig::default()).unwrap();
        let last = |column| series.last_value(column).unwrap();

        assert!(last(Column::Sma20).is_some());
        assert!(last(Column::Sma50).is_some());
        assert!(last(Column::Sma200).is_none());
        assert!(last(Column::MacdSignal).is_some());
        assert!(last(Column::BbUpper).is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = IndicatorConfig {
            rsi_period: 0,
            ..IndicatorConfig::default()
        };
        assert!(compute_indicators(&wavy_series(30), &config).is_err());
    }
}
