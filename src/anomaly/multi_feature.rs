//! Joint outliers across returns, log volume and both momentum features.

use ndarray::Array2;
use tracing::debug;

use crate::anomaly::AnomalyFlag;
use crate::config::ForestConfig;
use crate::error::Result;
use crate::forest::{IsolationForest, StandardScaler};
use crate::series::{Column, Series};

/// Feature columns, in matrix column order.
pub const FEATURES: [Column; 4] = [
    Column::Returns,
    Column::LogVolume,
    Column::PriceMomentum,
    Column::VolumeMomentum,
];

/// Standardizes the preprocessed features and flags joint outliers.
///
/// The series must already be preprocessed; a missing feature column fails
/// with `MissingColumn`. Null feature values (the first row) are treated as 0
/// before scaling. Adds `anomaly_score` and the `multi_feature` flag.
pub fn detect_multi_feature_anomalies(series: &Series, config: &ForestConfig) -> Result<Series> {
    let columns = FEATURES
        .iter()
        .map(|column| series.require(*column))
        .collect::<Result<Vec<_>>>()?;

    let raw = Array2::from_shape_fn((series.len(), FEATURES.len()), |(row, feature)| {
        columns[feature][row].unwrap_or(0.0)
    });
    let scaled = StandardScaler::fit_transform(&raw)?;

    let mut forest = IsolationForest::new(config.clone());
    let (flags, scores) = forest.fit_predict(&scaled)?;

    debug!(
        anomalies = flags.iter().filter(|f| **f).count(),
        rows = series.len(),
        "multi-feature detector"
    );

    let mut out = series.clone();
    out.set_column(Column::AnomalyScore, scores.into_iter().map(Some).collect());
    out.set_flag(AnomalyFlag::MultiFeature, flags);
    Ok(out)
}
