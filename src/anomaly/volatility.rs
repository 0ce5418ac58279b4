//! Volatility anomalies via a Z-score against the whole window's baseline.

use tracing::{debug, warn};

use crate::anomaly::AnomalyFlag;
use crate::anomaly::preprocess::preprocess;
use crate::error::Result;
use crate::series::rolling::{mean, sample_std};
use crate::series::{Column, Series};

/// Flags rows whose rolling volatility is more than `threshold` standard
/// deviations from the mean volatility of the entire series.
///
/// The baseline (mean and sample std of every defined `volatility` value) is
/// a single pair of scalars, not a rolling estimate. An existing `volatility`
/// column is reused only when its leading nulls show it was built with the
/// same `window`; otherwise it is rebuilt with `preprocess(series, window)`.
///
/// When the baseline std is zero or undefined (flat prices, too few defined
/// values) every row is non-anomalous and `z_score` stays null.
pub fn detect_volatility_anomalies(series: &Series, window: usize, threshold: f64) -> Result<Series> {
    series.ensure_rows(window)?;

    let mut out = match series.column(Column::Volatility) {
        Some(existing) if built_with_window(existing, window) => series.clone(),
        Some(existing) => {
            warn!(
                window,
                leading_nulls = existing.iter().take_while(|v| v.is_none()).count(),
                "volatility column built with another window, recomputing"
            );
            preprocess(series, window)
        }
        None => preprocess(series, window),
    };

    let volatility = out.require(Column::Volatility)?.to_vec();
    let defined: Vec<f64> = volatility.iter().flatten().copied().collect();

    let baseline = match (mean(&defined), sample_std(&defined)) {
        (Some(avg), Some(std)) if std > 0.0 && std.is_finite() => Some((avg, std)),
        _ => {
            debug!(
                defined = defined.len(),
                "degenerate volatility baseline, treating all rows as normal"
            );
            None
        }
    };

    let z_scores: Vec<Option<f64>> = volatility
        .iter()
        .map(|value| {
            let (avg, std) = baseline?;
            value.map(|v| (v - avg) / std)
        })
        .collect();

    let flags: Vec<bool> = z_scores
        .iter()
        .map(|z| z.is_some_and(|z| z.abs() > threshold))
        .collect();

    debug!(
        anomalies = flags.iter().filter(|f| **f).count(),
        threshold,
        "volatility detector"
    );

    out.set_column(Column::ZScore, z_scores);
    out.set_flag(AnomalyFlag::Volatility, flags);
    Ok(out)
}

/// Volatility over `window` returns is first defined at row `window`, since
/// returns start at row 1. A column with no defined value is accepted when
/// the series is too short to tell.
fn built_with_window(volatility: &[Option<f64>], window: usize) -> bool {
    let leading = volatility.iter().take_while(|v| v.is_none()).count();
    if leading == volatility.len() {
        volatility.len() <= window
    } else {
        leading == window
    }
}
