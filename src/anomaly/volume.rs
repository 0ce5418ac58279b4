//! Unusual traded volume via an isolation forest over raw volume.

use ndarray::Array2;
use tracing::debug;

use crate::anomaly::AnomalyFlag;
use crate::config::ForestConfig;
use crate::error::Result;
use crate::forest::IsolationForest;
use crate::series::{Column, Series};

/// Fits a forest on the single `volume` feature and flags the outlier rows.
///
/// Adds `volume_anomaly_score` (lower is more anomalous) and the `volume`
/// flag. With the default config roughly 10% of rows are flagged.
pub fn detect_volume_anomalies(series: &Series, config: &ForestConfig) -> Result<Series> {
    let volumes = series.volumes();
    let features = Array2::from_shape_fn((volumes.len(), 1), |(row, _)| volumes[row]);

    let mut forest = IsolationForest::new(config.clone());
    let (flags, scores) = forest.fit_predict(&features)?;

    debug!(
        anomalies = flags.iter().filter(|f| **f).count(),
        rows = series.len(),
        "volume detector"
    );

    let mut out = series.clone();
    out.set_column(Column::VolumeAnomalyScore, scores.into_iter().map(Some).collect());
    out.set_flag(AnomalyFlag::Volume, flags);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::fixtures::{series_from, wavy_series};
    use crate::error::AnomalyError;

    fn volume_burst() -> Series {
        let closes = vec![100.0; 100];
        let mut volumes: Vec<f64> = (0..100).map(|i| 1_000.0 + (i % 7) as f64 * 10.0).collect();
        volumes[60] = 50_000.0;
        series_from(&closes, &volumes)
    }

    #[test]
    fn test_burst_is_flagged() {
        let series = detect_volume_anomalies(&volume_burst(), &ForestConfig::volume()).unwrap();
        assert!(series.flag(AnomalyFlag::Volume).unwrap()[60]);

        let scores = series.column(Column::VolumeAnomalyScore).unwrap();
        let burst = scores[60].unwrap();
        assert!(scores.iter().flatten().all(|s| *s >= burst));
    }

    #[test]
    fn test_flags_about_contamination_share() {
        let series = detect_volume_anomalies(&wavy_series(200), &ForestConfig::volume()).unwrap();
        let flagged = series
            .flag(AnomalyFlag::Volume)
            .unwrap()
            .iter()
            .filter(|f| **f)
            .count();
        assert!(flagged > 0 && flagged <= 40, "flagged {flagged}");
    }

    #[test]
    fn test_deterministic_for_seed() {
        let series = wavy_series(120);
        let a = detect_volume_anomalies(&series, &ForestConfig::volume()).unwrap();
        let b = detect_volume_anomalies(&series, &ForestConfig::volume()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_series_fails() {
        let err = detect_volume_anomalies(&Series::default(), &ForestConfig::volume()).unwrap_err();
        assert!(matches!(err, AnomalyError::ModelFit(_)));
    }
}
