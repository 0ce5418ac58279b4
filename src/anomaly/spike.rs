//! Sudden close-to-close price moves.

use tracing::debug;

use crate::anomaly::AnomalyFlag;
use crate::error::Result;
use crate::series::rolling::pct_change;
use crate::series::{Column, Series};

/// Flags rows where `|close[t] / close[t-1] - 1| > threshold`.
///
/// Adds `price_change`. The first row has no prior close and is never a spike.
pub fn detect_price_spikes(series: &Series, threshold: f64) -> Result<Series> {
    let changes = pct_change(&series.closes());
    let flags: Vec<bool> = changes
        .iter()
        .map(|change| change.is_some_and(|c| c.abs() > threshold))
        .collect();

    debug!(
        spikes = flags.iter().filter(|f| **f).count(),
        threshold,
        "price spike detector"
    );

    let mut out = series.clone();
    out.set_column(Column::PriceChange, changes);
    out.set_flag(AnomalyFlag::PriceSpike, flags);
    Ok(out)
}
