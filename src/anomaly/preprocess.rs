//! Derived feature columns shared by the detectors.

use tracing::debug;

use crate::series::rolling::{diff, pct_change, rolling_std};
use crate::series::{Column, Series};

/// Adds returns, rolling volatility, log volume and momentum columns.
///
/// - `returns[t] = close[t] / close[t-1] - 1`
/// - `volatility[t]` = sample std of the trailing `window` returns
/// - `log_volume[t] = ln(1 + volume[t])`
/// - `price_momentum[t] = close[t] - close[t-1]`, `volume_momentum` likewise
///
/// Rows without enough history get `None`. Never fails.
pub fn preprocess(series: &Series, window: usize) -> Series {
    let closes = series.closes();
    let volumes = series.volumes();

    let returns = pct_change(&closes);
    let volatility = rolling_std(&returns, window);
    let log_volume = volumes.iter().map(|v| Some(v.ln_1p())).collect();

    let mut out = series.clone();
    out.set_column(Column::Returns, returns);
    out.set_column(Column::Volatility, volatility);
    out.set_column(Column::LogVolume, log_volume);
    out.set_column(Column::PriceMomentum, diff(&closes));
    out.set_column(Column::VolumeMomentum, diff(&volumes));

    debug!(rows = out.len(), window, "preprocessed series");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::fixtures::{series_from, wavy_series};

    #[test]
    fn test_first_row_is_null() {
        let series = preprocess(&series_from(&[100.0, 102.0, 101.0], &[10.0, 20.0, 5.0]), 2);

        assert_eq!(series.column(Column::Returns).unwrap()[0], None);
        assert_eq!(series.column(Column::PriceMomentum).unwrap()[1], Some(2.0));
        assert_eq!(series.column(Column::VolumeMomentum).unwrap()[2], Some(-15.0));

        let log_volume = series.column(Column::LogVolume).unwrap();
        assert!((log_volume[0].unwrap() - 11.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_needs_full_window_of_returns() {
        let series = preprocess(&wavy_series(30), 20);
        let volatility = series.column(Column::Volatility).unwrap();

        // returns start at row 1, so 20 returns are first available at row 20
        assert!(volatility[..20].iter().all(Option::is_none));
        assert!(volatility[20..].iter().all(Option::is_some));
    }

    #[test]
    fn test_input_is_not_modified() {
        let original = wavy_series(25);
        let processed = preprocess(&original, 20);
        assert!(!original.has_column(Column::Returns));
        assert!(processed.has_column(Column::Returns));
        assert_eq!(processed.candles(), original.candles());
    }

    #[test]
    fn test_short_series_does_not_fail() {
        let series = preprocess(&series_from(&[100.0], &[1.0]), 20);
        assert_eq!(series.column(Column::Volatility).unwrap(), &[None]);
    }
}
