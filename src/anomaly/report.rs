//! Snapshot summary of the flagged series.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::anomaly::AnomalyFlag;
use crate::anomaly::severity::Severity;
use crate::series::Series;

/// How many anomalous rows the report keeps.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyEvent {
    pub timestamp: u64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnomalyReport {
    /// Sum of every flag over every row.
    pub total_anomalies: usize,
    pub anomaly_types: BTreeMap<AnomalyFlag, usize>,
    /// Up to the last ten rows with any flag set, oldest first.
    pub recent_anomalies: Vec<AnomalyEvent>,
    /// Empty unless severity was assigned upstream.
    pub severity_distribution: BTreeMap<Severity, usize>,
}

pub fn build_report(series: &Series) -> AnomalyReport {
    let anomaly_types: BTreeMap<AnomalyFlag, usize> = series
        .flags()
        .map(|(flag, values)| (flag, values.iter().filter(|v| **v).count()))
        .collect();
    let total_anomalies = anomaly_types.values().sum();

    let anomalous: Vec<usize> = (0..series.len()).filter(|i| series.any_flag_at(*i)).collect();
    let recent_anomalies = anomalous[anomalous.len().saturating_sub(RECENT_LIMIT)..]
        .iter()
        .map(|&i| {
            let candle = &series.candles()[i];
            AnomalyEvent {
                timestamp: candle.get_timestamp(),
                close: candle.get_close(),
                volume: candle.get_volume(),
            }
        })
        .collect();

    let severity_distribution = series
        .severity()
        .map(|levels| {
            Severity::ALL
                .iter()
                .map(|level| (*level, levels.iter().filter(|s| *s == level).count()))
                .collect()
        })
        .unwrap_or_default();

    AnomalyReport {
        total_anomalies,
        anomaly_types,
        recent_anomalies,
        severity_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::fixtures::{flat_series, series_from};
    use crate::anomaly::severity::assign_severity;

    #[test]
    fn test_counts_and_total() {
        let series = flat_series(4, 10.0)
            .with_flag(AnomalyFlag::Volume, vec![true, false, true, false])
            .unwrap()
            .with_flag(AnomalyFlag::Pattern, vec![true, false, false, false])
            .unwrap();
        let report = build_report(&assign_severity(&series));

        assert_eq!(report.total_anomalies, 3);
        assert_eq!(report.anomaly_types[&AnomalyFlag::Volume], 2);
        assert_eq!(report.anomaly_types[&AnomalyFlag::Pattern], 1);
        assert_eq!(report.recent_anomalies.len(), 2);
        assert_eq!(report.severity_distribution[&Severity::Normal], 2);
        assert_eq!(report.severity_distribution[&Severity::Low], 1);
        assert_eq!(report.severity_distribution[&Severity::Medium], 1);
        assert_eq!(report.severity_distribution[&Severity::High], 0);
    }

    #[test]
    fn test_recent_keeps_last_ten() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = series_from(&closes, &vec![5.0; 15])
            .with_flag(AnomalyFlag::PriceSpike, vec![true; 15])
            .unwrap();
        let report = build_report(&series);

        assert_eq!(report.recent_anomalies.len(), 10);
        assert_eq!(report.recent_anomalies[0].close, 105.0);
        assert_eq!(report.recent_anomalies[9].close, 114.0);
        assert_eq!(report.recent_anomalies[9].timestamp, 15 * 60_000);
    }

    #[test]
    fn test_without_severity_or_flags() {
        let report = build_report(&flat_series(5, 1.0));
        assert_eq!(report, AnomalyReport::default());
    }

    #[test]
    fn test_serializes_flag_names() {
        let series = flat_series(2, 1.0)
            .with_flag(AnomalyFlag::MultiFeature, vec![false, true])
            .unwrap();
        let json = serde_json::to_value(build_report(&series)).unwrap();
        assert_eq!(json["anomaly_types"]["multi_feature"], 1);
        assert_eq!(json["recent_anomalies"][0]["volume"], 1_000.0);
    }
}
