//! Anomaly detectors, severity aggregation and reporting.
//!
//! Each detector is independent: it reads base or preprocessed columns,
//! writes its own flag (and score) columns into a copy of the series, and
//! never consumes another detector's output.

pub mod multi_feature;
pub mod pattern;
pub mod preprocess;
pub mod report;
pub mod severity;
pub mod spike;
pub mod volatility;
pub mod volume;

use serde::Serialize;

pub use multi_feature::detect_multi_feature_anomalies;
pub use pattern::detect_pattern_anomalies;
pub use preprocess::preprocess;
pub use report::{AnomalyEvent, AnomalyReport, build_report};
pub use severity::{Severity, assign_severity};
pub use spike::detect_price_spikes;
pub use volatility::detect_volatility_anomalies;
pub use volume::detect_volume_anomalies;

/// The closed set of per-row anomaly flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyFlag {
    Volatility,
    Volume,
    PriceSpike,
    Pattern,
    MultiFeature,
}

impl AnomalyFlag {
    pub const ALL: [AnomalyFlag; 5] = [
        AnomalyFlag::Volatility,
        AnomalyFlag::Volume,
        AnomalyFlag::PriceSpike,
        AnomalyFlag::Pattern,
        AnomalyFlag::MultiFeature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyFlag::Volatility => "volatility",
            AnomalyFlag::Volume => "volume",
            AnomalyFlag::PriceSpike => "price_spike",
            AnomalyFlag::Pattern => "pattern",
            AnomalyFlag::MultiFeature => "multi_feature",
        }
    }

    /// Display title used by the report panel.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyFlag::Volatility => "Volatility",
            AnomalyFlag::Volume => "Volume",
            AnomalyFlag::PriceSpike => "Price Spike",
            AnomalyFlag::Pattern => "Pattern",
            AnomalyFlag::MultiFeature => "Multi Feature",
        }
    }
}

impl std::fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
