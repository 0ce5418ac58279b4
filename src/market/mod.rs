//! Market data module: exchange kline streams, REST history and the
//! rolling candle window the analyzer reads from.

pub mod candle_window;
pub mod kline;
pub mod message_parser;
pub mod providers;
pub mod streams;
pub mod websocket_client;

// Re-exports for convenience
pub use candle_window::{CandleWindow, Upsert};
pub use kline::KlineEvent;
pub use message_parser::MessageParser;
pub use streams::KlineStream;
pub use websocket_client::WebSocketClient;

pub use providers::binance::{fetch_klines, new_binance_client};
