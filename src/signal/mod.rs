//! Rule-based trading signal from the latest indicator row.
//!
//! Each rule adds a fixed contribution to an integer score:
//!
//! | Rule                  | Score | Label              |
//! |-----------------------|-------|--------------------|
//! | RSI below oversold    | +2    | RSI Oversold       |
//! | RSI above overbought  | -2    | RSI Overbought     |
//! | MACD above signal     | +1    | MACD Bullish       |
//! | otherwise             | -1    | MACD Bearish       |
//! | SMA20 above SMA50     | +1    | MA Bullish Cross   |
//! | otherwise             | -1    | MA Bearish Cross   |
//! | close below lower BB  | +1    | BB Oversold        |
//! | close above upper BB  | -1    | BB Overbought      |
//!
//! A score of 3 or more is a BUY, -3 or less a SELL, anything else a HOLD.
//! A null indicator value makes its comparison false, so null RSI or bands
//! add nothing while null MACD or moving averages take the bearish branch.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::IndicatorConfig;
use crate::error::{AnomalyError, Result};
use crate::series::{Column, Series};

/// Magnitude at which confidence saturates.
pub const MAX_CONFIDENCE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    pub fn from_score(score: i32) -> Self {
        if score >= 3 {
            SignalAction::Buy
        } else if score <= -3 {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            SignalAction::Buy => "Strong bullish momentum detected",
            SignalAction::Sell => "Strong bearish momentum detected",
            SignalAction::Hold => "Market consolidating, wait for clearer signal",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fired rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubSignal {
    RsiOversold,
    RsiOverbought,
    MacdBullish,
    MacdBearish,
    MaBullishCross,
    MaBearishCross,
    BbOversold,
    BbOverbought,
}

impl SubSignal {
    pub fn contribution(&self) -> i32 {
        match self {
            SubSignal::RsiOversold => 2,
            SubSignal::RsiOverbought => -2,
            SubSignal::MacdBullish | SubSignal::MaBullishCross | SubSignal::BbOversold => 1,
            SubSignal::MacdBearish | SubSignal::MaBearishCross | SubSignal::BbOverbought => -1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubSignal::RsiOversold => "RSI Oversold",
            SubSignal::RsiOverbought => "RSI Overbought",
            SubSignal::MacdBullish => "MACD Bullish",
            SubSignal::MacdBearish => "MACD Bearish",
            SubSignal::MaBullishCross => "MA Bullish Cross",
            SubSignal::MaBearishCross => "MA Bearish Cross",
            SubSignal::BbOversold => "BB Oversold",
            SubSignal::BbOverbought => "BB Overbought",
        }
    }
}

impl fmt::Display for SubSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub action: SignalAction,
    pub score: i32,
    pub reason: &'static str,
    /// Fired rules in evaluation order.
    pub sub_signals: Vec<SubSignal>,
}

impl Signal {
    pub fn from_sub_signals(sub_signals: Vec<SubSignal>) -> Self {
        let score = sub_signals.iter().map(SubSignal::contribution).sum();
        let action = SignalAction::from_score(score);
        Self {
            action,
            score,
            reason: action.reason(),
            sub_signals,
        }
    }

    /// |score| capped at `MAX_CONFIDENCE`.
    pub fn confidence(&self) -> u32 {
        self.score.unsigned_abs().min(MAX_CONFIDENCE)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.sub_signals.iter().map(SubSignal::label).collect()
    }
}

/// Latest-row values the rules read. `None` is a null cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_upper: Option<f64>,
}

impl IndicatorSnapshot {
    /// Reads the final row. Fails on an empty series or a missing column.
    pub fn latest(series: &Series) -> Result<Self> {
        let last = series
            .candles()
            .last()
            .ok_or(AnomalyError::InsufficientData {
                required: 1,
                actual: 0,
            })?;

        Ok(Self {
            close: last.get_close(),
            rsi: series.last_value(Column::Rsi)?,
            macd: series.last_value(Column::Macd)?,
            macd_signal: series.last_value(Column::MacdSignal)?,
            sma_short: series.last_value(Column::Sma20)?,
            sma_long: series.last_value(Column::Sma50)?,
            bb_lower: series.last_value(Column::BbLower)?,
            bb_upper: series.last_value(Column::BbUpper)?,
        })
    }

    pub fn sub_signals(&self, config: &IndicatorConfig) -> Vec<SubSignal> {
        let mut fired = Vec::with_capacity(4);

        match self.rsi {
            Some(rsi) if rsi < config.rsi_oversold => fired.push(SubSignal::RsiOversold),
            Some(rsi) if rsi > config.rsi_overbought => fired.push(SubSignal::RsiOverbought),
            _ => {}
        }

        fired.push(if greater(self.macd, self.macd_signal) {
            SubSignal::MacdBullish
        } else {
            SubSignal::MacdBearish
        });

        fired.push(if greater(self.sma_short, self.sma_long) {
            SubSignal::MaBullishCross
        } else {
            SubSignal::MaBearishCross
        });

        if self.bb_lower.is_some_and(|lower| self.close < lower) {
            fired.push(SubSignal::BbOversold);
        } else if self.bb_upper.is_some_and(|upper| self.close > upper) {
            fired.push(SubSignal::BbOverbought);
        }

        fired
    }
}

fn greater(left: Option<f64>, right: Option<f64>) -> bool {
    matches!((left, right), (Some(l), Some(r)) if l > r)
}

/// Scores the final row of an indicator-bearing series.
pub fn score_signal(series: &Series, config: &IndicatorConfig) -> Result<Signal> {
    let snapshot = IndicatorSnapshot::latest(series)?;
    let signal = Signal::from_sub_signals(snapshot.sub_signals(config));

    debug!(
        action = %signal.action,
        score = signal.score,
        labels = ?signal.labels(),
        "trading signal"
    );
    Ok(signal)
}
