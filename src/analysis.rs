//! End-to-end analysis of one candle window.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::anomaly::{
    AnomalyReport, assign_severity, build_report, detect_multi_feature_anomalies,
    detect_pattern_anomalies, detect_price_spikes, detect_volatility_anomalies,
    detect_volume_anomalies, preprocess,
};
use crate::config::{DetectorConfig, IndicatorConfig};
use crate::error::Result;
use crate::indicators::compute_indicators;
use crate::series::Series;
use crate::signal::{Signal, score_signal};

/// Everything the dashboard shows for one refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub series: Series,
    pub report: AnomalyReport,
    pub signal: Signal,
}

/// Summary fields suitable for a log line or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary<'a> {
    pub last_close: Option<f64>,
    pub report: &'a AnomalyReport,
    pub signal: &'a Signal,
    pub confidence: u32,
}

impl Analysis {
    pub fn summary(&self) -> AnalysisSummary<'_> {
        AnalysisSummary {
            last_close: self.series.candles().last().map(|c| c.get_close()),
            report: &self.report,
            signal: &self.signal,
            confidence: self.signal.confidence(),
        }
    }
}

/// Runs the detector pipeline with fixed, validated parameters.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    detectors: DetectorConfig,
    indicators: IndicatorConfig,
}

impl Analyzer {
    pub fn new(detectors: DetectorConfig, indicators: IndicatorConfig) -> Result<Self> {
        detectors.validate()?;
        indicators.validate()?;
        Ok(Self {
            detectors,
            indicators,
        })
    }

    pub fn detector_config(&self) -> &DetectorConfig {
        &self.detectors
    }

    pub fn indicator_config(&self) -> &IndicatorConfig {
        &self.indicators
    }

    /// Preprocesses, runs every detector and assigns severity.
    #[instrument(skip_all, fields(rows = series.len()))]
    pub fn detect(&self, series: &Series) -> Result<Series> {
        let config = &self.detectors;
        series.ensure_rows(config.window)?;

        let series = preprocess(series, config.window);
        let series = detect_volatility_anomalies(&series, config.window, config.zscore_threshold)?;
        let series = detect_volume_anomalies(&series, &config.volume)?;
        let series = detect_price_spikes(&series, config.spike_threshold)?;
        let series = detect_pattern_anomalies(&series, config.window, config.band_multiplier)?;
        let series = detect_multi_feature_anomalies(&series, &config.multi_feature)?;
        let series = assign_severity(&series);

        debug!("detectors complete");
        Ok(series)
    }

    /// `detect`, then indicators, report and signal.
    pub fn analyze(&self, series: &Series) -> Result<Analysis> {
        let series = self.detect(series)?;
        let series = compute_indicators(&series, &self.indicators)?;
        let report = build_report(&series);
        let signal = score_signal(&series, &self.indicators)?;

        Ok(Analysis {
            series,
            report,
            signal,
        })
    }
}
