//! OHLCV anomaly detection and rule-based trading signals.
//!
//! A [`Series`] of candles flows through independent detectors (volatility
//! z-score, volume and multi-feature isolation forests, price spikes,
//! Bollinger-style breakouts), a severity aggregator and a report builder.
//! Technical indicators feed an additive signal scorer. [`Analyzer`] runs
//! the whole pipeline; the `market` module streams live Binance klines into
//! a [`market::CandleWindow`] for it.

pub mod analysis;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod forest;
pub mod indicators;
pub mod market;
pub mod series;
pub mod signal;

pub use analysis::{Analysis, AnalysisSummary, Analyzer};
pub use anomaly::{AnomalyEvent, AnomalyFlag, AnomalyReport, Severity};
pub use config::{DashboardConfig, DetectorConfig, ForestConfig, IndicatorConfig};
pub use error::{AnomalyError, Result};
pub use indicators::candle::Candle;
pub use indicators::timeframe::Timeframe;
pub use series::{Column, Series};
pub use signal::{Signal, SignalAction, SubSignal, score_signal};
