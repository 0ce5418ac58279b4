//! Detector, indicator and dashboard configuration.
//!
//! Every detector call receives its parameters explicitly; nothing here is
//! process-wide state. Defaults mirror the dashboard's shipped settings.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::{AnomalyError, Result};
use crate::indicators::timeframe::Timeframe;

/// Parameters for one isolation-forest detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Expected share of outliers, in (0, 0.5].
    pub contamination: f64,
    /// Rows drawn per tree. `None` means min(256, rows).
    pub max_samples: Option<usize>,
    /// Draw tree samples with replacement.
    pub bootstrap: bool,
    /// Seed for tree construction. Same data and seed give identical labels.
    pub seed: u64,
}

impl ForestConfig {
    pub fn volume() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            max_samples: None,
            bootstrap: false,
            seed: 42,
        }
    }

    pub fn multi_feature() -> Self {
        Self {
            n_estimators: 200,
            contamination: 0.15,
            max_samples: None,
            bootstrap: true,
            seed: 42,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(AnomalyError::invalid("n_estimators", 0.0, "must be positive"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnomalyError::invalid(
                "contamination",
                self.contamination,
                "must be in (0, 0.5]",
            ));
        }
        if self.max_samples == Some(0) {
            return Err(AnomalyError::invalid("max_samples", 0.0, "must be positive"));
        }
        Ok(())
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self::volume()
    }
}

/// Fields present in a `[detector.*]` forest table. Absent fields keep the
/// detector's own defaults rather than `ForestConfig::default()`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ForestOverrides {
    n_estimators: Option<usize>,
    contamination: Option<f64>,
    max_samples: Option<usize>,
    bootstrap: Option<bool>,
    seed: Option<u64>,
}

impl ForestOverrides {
    fn apply(self, base: ForestConfig) -> ForestConfig {
        ForestConfig {
            n_estimators: self.n_estimators.unwrap_or(base.n_estimators),
            contamination: self.contamination.unwrap_or(base.contamination),
            max_samples: self.max_samples.or(base.max_samples),
            bootstrap: self.bootstrap.unwrap_or(base.bootstrap),
            seed: self.seed.unwrap_or(base.seed),
        }
    }
}

fn volume_forest<'de, D>(deserializer: D) -> std::result::Result<ForestConfig, D::Error>
where
    D: Deserializer<'de>,
{
    ForestOverrides::deserialize(deserializer).map(|o| o.apply(ForestConfig::volume()))
}

fn multi_feature_forest<'de, D>(deserializer: D) -> std::result::Result<ForestConfig, D::Error>
where
    D: Deserializer<'de>,
{
    ForestOverrides::deserialize(deserializer).map(|o| o.apply(ForestConfig::multi_feature()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Rolling window for volatility and Bollinger-style bands.
    pub window: usize,
    /// |z| above this flags a volatility anomaly.
    pub zscore_threshold: f64,
    /// Fractional close-to-close move that counts as a spike.
    pub spike_threshold: f64,
    /// Band width in standard deviations for the pattern detector.
    pub band_multiplier: f64,
    #[serde(deserialize_with = "volume_forest")]
    pub volume: ForestConfig,
    #[serde(deserialize_with = "multi_feature_forest")]
    pub multi_feature: ForestConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window: 20,
            zscore_threshold: 3.0,
            spike_threshold: 0.05,
            band_multiplier: 2.0,
            volume: ForestConfig::volume(),
            multi_feature: ForestConfig::multi_feature(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(AnomalyError::invalid("window", self.window as f64, "must be at least 2"));
        }
        if !(self.zscore_threshold >= 0.0) {
            return Err(AnomalyError::invalid(
                "zscore_threshold",
                self.zscore_threshold,
                "must be non-negative",
            ));
        }
        if !(self.spike_threshold >= 0.0) {
            return Err(AnomalyError::invalid(
                "spike_threshold",
                self.spike_threshold,
                "must be non-negative",
            ));
        }
        if !(self.band_multiplier > 0.0) {
            return Err(AnomalyError::invalid(
                "band_multiplier",
                self.band_multiplier,
                "must be positive",
            ));
        }
        self.volume.validate()?;
        self.multi_feature.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub sma_extra_long: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub atr_period: usize,
    pub stochastic_period: usize,
    pub mfi_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            sma_extra_long: 200,
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            atr_period: 14,
            stochastic_period: 14,
            mfi_period: 14,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("sma_extra_long", self.sma_extra_long),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("atr_period", self.atr_period),
            ("stochastic_period", self.stochastic_period),
            ("mfi_period", self.mfi_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(AnomalyError::invalid(name, 0.0, "must be positive"));
            }
        }
        if self.bollinger_period < 2 {
            return Err(AnomalyError::invalid(
                "bollinger_period",
                self.bollinger_period as f64,
                "must be at least 2",
            ));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(AnomalyError::invalid(
                "rsi_oversold",
                self.rsi_oversold,
                "must be below rsi_overbought",
            ));
        }
        Ok(())
    }
}

/// Top-level settings for the live dashboard binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Candles kept in the analysis window.
    pub history_limit: usize,
    pub refresh_interval_secs: u64,
    pub log_level: String,
    pub log_json: bool,
    pub detector: DetectorConfig,
    pub indicators: IndicatorConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            timeframe: Timeframe::M1,
            history_limit: 200,
            refresh_interval_secs: 5,
            log_level: "info".to_string(),
            log_json: false,
            detector: DetectorConfig::default(),
            indicators: IndicatorConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub const PATH_ENV: &'static str = "SENTINEL_CONFIG_PATH";
    pub const DEFAULT_PATH: &'static str = "config/sentinel.toml";

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("invalid dashboard config")?;
        config.detector.validate()?;
        config.indicators.validate()?;
        Ok(config)
    }

    /// Loads the TOML file at `path`, or defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolves the config path from the environment and loads it.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let path = std::env::var(Self::PATH_ENV).unwrap_or_else(|_| Self::DEFAULT_PATH.to_string());
        Self::load(path)
    }
}
