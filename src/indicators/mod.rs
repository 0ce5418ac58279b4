//! Technical indicators for market analysis

pub mod candle;
pub mod momentum;
pub mod moving_averages;
pub mod technical;
pub mod timeframe;
pub mod volatility;

pub use technical::compute_indicators;
