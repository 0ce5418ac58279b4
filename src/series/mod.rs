//! The candle table plus every derived, flag and severity column.
//!
//! A `Series` owns its candles and a set of row-aligned columns. Numeric
//! columns are nullable (`None` where history is insufficient), flag columns
//! are keyed by the closed `AnomalyFlag` set rather than by name pattern.
//! Detectors never mutate a caller's series: they clone, extend, and return.

pub mod rolling;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::anomaly::AnomalyFlag;
use crate::anomaly::severity::Severity;
use crate::error::{AnomalyError, Result};
use crate::indicators::candle::Candle;

/// Derived numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    // preprocessing
    Returns,
    Volatility,
    LogVolume,
    PriceMomentum,
    VolumeMomentum,
    // detector outputs
    ZScore,
    PriceChange,
    RollingMean,
    RollingStd,
    UpperBound,
    LowerBound,
    VolumeAnomalyScore,
    AnomalyScore,
    // technical indicators
    Sma20,
    Sma50,
    Sma200,
    Ema12,
    Ema26,
    Macd,
    MacdSignal,
    MacdHistogram,
    Rsi,
    BbMiddle,
    BbUpper,
    BbLower,
    BbWidth,
    Stochastic,
    Atr,
    Obv,
    Mfi,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Returns => "returns",
            Column::Volatility => "volatility",
            Column::LogVolume => "log_volume",
            Column::PriceMomentum => "price_momentum",
            Column::VolumeMomentum => "volume_momentum",
            Column::ZScore => "z_score",
            Column::PriceChange => "price_change",
            Column::RollingMean => "rolling_mean",
            Column::RollingStd => "rolling_std",
            Column::UpperBound => "upper_bound",
            Column::LowerBound => "lower_bound",
            Column::VolumeAnomalyScore => "volume_anomaly_score",
            Column::AnomalyScore => "anomaly_score",
            Column::Sma20 => "sma_20",
            Column::Sma50 => "sma_50",
            Column::Sma200 => "sma_200",
            Column::Ema12 => "ema_12",
            Column::Ema26 => "ema_26",
            Column::Macd => "macd",
            Column::MacdSignal => "macd_signal",
            Column::MacdHistogram => "macd_histogram",
            Column::Rsi => "rsi",
            Column::BbMiddle => "bb_middle",
            Column::BbUpper => "bb_upper",
            Column::BbLower => "bb_lower",
            Column::BbWidth => "bb_width",
            Column::Stochastic => "stochastic",
            Column::Atr => "atr",
            Column::Obv => "obv",
            Column::Mfi => "mfi",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    candles: Vec<Candle>,
    columns: BTreeMap<Column, Vec<Option<f64>>>,
    flags: BTreeMap<AnomalyFlag, Vec<bool>>,
    anomaly_count: Option<Vec<usize>>,
    severity: Option<Vec<Severity>>,
}

impl Series {
    /// Creates a series from candles ordered by increasing open time.
    pub fn new(candles: Vec<Candle>) -> Self {
        debug_assert!(
            candles
                .windows(2)
                .all(|pair| pair[0].get_timestamp() < pair[1].get_timestamp()),
            "candles must be ordered by strictly increasing timestamp"
        );

        Self {
            candles,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.get_close()).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.get_volume()).collect()
    }

    /// Fails with `InsufficientData` when the series has fewer than `required` rows.
    pub fn ensure_rows(&self, required: usize) -> Result<()> {
        if self.len() < required {
            return Err(AnomalyError::InsufficientData {
                required,
                actual: self.len(),
            });
        }
        Ok(())
    }

    pub fn column(&self, column: Column) -> Option<&[Option<f64>]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    /// Like `column`, but a missing column is a wiring error.
    pub fn require(&self, column: Column) -> Result<&[Option<f64>]> {
        self.column(column).ok_or(AnomalyError::MissingColumn(column))
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    /// Value of `column` on the most recent row.
    pub fn last_value(&self, column: Column) -> Result<Option<f64>> {
        let values = self.require(column)?;
        Ok(values.last().copied().flatten())
    }

    /// Adds or replaces a numeric column supplied by the caller.
    pub fn with_column(mut self, column: Column, values: Vec<Option<f64>>) -> Result<Self> {
        self.check_len(column.as_str(), values.len())?;
        self.columns.insert(column, values);
        Ok(self)
    }

    /// Adds or replaces a flag column supplied by the caller.
    pub fn with_flag(mut self, flag: AnomalyFlag, values: Vec<bool>) -> Result<Self> {
        self.check_len(flag.as_str(), values.len())?;
        self.flags.insert(flag, values);
        Ok(self)
    }

    pub(crate) fn set_column(&mut self, column: Column, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.len(), "column {column} is misaligned");
        self.columns.insert(column, values);
    }

    pub(crate) fn set_flag(&mut self, flag: AnomalyFlag, values: Vec<bool>) {
        debug_assert_eq!(values.len(), self.len(), "flag {} is misaligned", flag.as_str());
        self.flags.insert(flag, values);
    }

    pub(crate) fn set_severity(&mut self, counts: Vec<usize>, severity: Vec<Severity>) {
        debug_assert_eq!(counts.len(), self.len());
        debug_assert_eq!(severity.len(), self.len());
        self.anomaly_count = Some(counts);
        self.severity = Some(severity);
    }

    pub fn flag(&self, flag: AnomalyFlag) -> Option<&[bool]> {
        self.flags.get(&flag).map(Vec::as_slice)
    }

    /// Present flag columns in `AnomalyFlag` order.
    pub fn flags(&self) -> impl Iterator<Item = (AnomalyFlag, &[bool])> + '_ {
        self.flags.iter().map(|(flag, values)| (*flag, values.as_slice()))
    }

    /// True when any present flag fires on row `index`.
    pub fn any_flag_at(&self, index: usize) -> bool {
        self.flags.values().any(|values| values.get(index).copied().unwrap_or(false))
    }

    pub fn anomaly_count(&self) -> Option<&[usize]> {
        self.anomaly_count.as_deref()
    }

    pub fn severity(&self) -> Option<&[Severity]> {
        self.severity.as_deref()
    }

    fn check_len(&self, name: &str, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(AnomalyError::LengthMismatch {
                column: name.to_string(),
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }
}
