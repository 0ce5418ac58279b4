//! Bollinger-style breakouts of close price.

use tracing::debug;

use crate::anomaly::AnomalyFlag;
use crate::error::Result;
use crate::series::rolling::{dense, rolling_mean, rolling_std};
use crate::series::{Column, Series};

/// Flags rows whose close is strictly outside `mean ± band_multiplier · std`
/// of the trailing `window` closes.
///
/// Adds `rolling_mean`, `rolling_std`, `upper_bound` and `lower_bound`. The
/// first `window - 1` rows have no bands and are never flagged.
pub fn detect_pattern_anomalies(series: &Series, window: usize, band_multiplier: f64) -> Result<Series> {
    series.ensure_rows(window)?;

    let closes = series.closes();
    let means = rolling_mean(&dense(&closes), window);
    let stds = rolling_std(&dense(&closes), window);

    let upper: Vec<Option<f64>> = means
        .iter()
        .zip(&stds)
        .map(|(m, s)| Some((*m)? + band_multiplier * (*s)?))
        .collect();
    let lower: Vec<Option<f64>> = means
        .iter()
        .zip(&stds)
        .map(|(m, s)| Some((*m)? - band_multiplier * (*s)?))
        .collect();

    let flags: Vec<bool> = closes
        .iter()
        .zip(upper.iter().zip(&lower))
        .map(|(close, bounds)| match bounds {
            (Some(up), Some(low)) => close > up || close < low,
            _ => false,
        })
        .collect();

    debug!(
        breakouts = flags.iter().filter(|f| **f).count(),
        window,
        "pattern detector"
    );

    let mut out = series.clone();
    out.set_column(Column::RollingMean, means);
    out.set_column(Column::RollingStd, stds);
    out.set_column(Column::UpperBound, upper);
    out.set_column(Column::LowerBound, lower);
    out.set_flag(AnomalyFlag::Pattern, flags);
    Ok(out)
}
