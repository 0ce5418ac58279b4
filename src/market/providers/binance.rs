//! Binance spot kline stream and REST history.

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::indicators::candle::Candle;
use crate::indicators::timeframe::Timeframe;
use crate::market::kline::KlineEvent;
use crate::market::message_parser::MessageParser;
use crate::market::streams::KlineStream;
use crate::market::websocket_client::WebSocketClient;

pub const BINANCE_WSS_BASE_ENDPOINT: &str = "wss://stream.binance.com:443/ws";
pub const BINANCE_WSS_FALLBACK_ENDPOINT: &str = "wss://stream.binance.com:9443/ws";
pub const BINANCE_REST_BASE_ENDPOINT: &str = "https://api.binance.com";

/// Binance rejects kline requests above this limit.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

// Wire shape of a kline push:
// {"e":"kline","E":..,"s":"BTCUSDT","k":{"t":..,"i":"1m","o":"..","c":"..","h":"..","l":"..","v":"..","x":false}}
// Prices and volume arrive as decimal strings.

#[derive(Debug, Deserialize)]
struct KlineMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    #[serde(rename = "t")]
    open_time: u64,
    #[serde(rename = "i")]
    interval: Timeframe,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "x")]
    is_closed: bool,
}

/// Builds a candle from wire values, rejecting values that cannot form one.
fn candle_from_parts(open_time: u64, ohlcv: [&str; 5]) -> anyhow::Result<Candle> {
    let mut values = [0.0; 5];
    for (slot, raw) in values.iter_mut().zip(ohlcv) {
        *slot = raw
            .parse::<f64>()
            .with_context(|| format!("invalid decimal {raw:?}"))?;
    }
    let [open, high, low, close, volume] = values;

    if !values.iter().all(|v| v.is_finite()) || volume < 0.0 {
        bail!("non-finite or negative kline values at {open_time}");
    }
    if high < low || open < low || open > high || close < low || close > high {
        bail!("inconsistent OHLC at {open_time}: o={open} h={high} l={low} c={close}");
    }
    Ok(Candle::new(open_time, open, high, low, close, volume))
}

/// Binance-specific message parser.
#[derive(Debug, Clone, Default)]
pub struct BinanceParser;

impl BinanceParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_kline(&self, msg: &str) -> anyhow::Result<KlineEvent> {
        let message: KlineMessage = serde_json::from_str(msg).context("malformed kline message")?;
        if message.event_type != "kline" {
            bail!("unexpected event type {}", message.event_type);
        }

        let k = &message.kline;
        let ohlcv = [
            k.open.as_str(),
            k.high.as_str(),
            k.low.as_str(),
            k.close.as_str(),
            k.volume.as_str(),
        ];
        let candle = candle_from_parts(k.open_time, ohlcv)?;
        Ok(KlineEvent::new(message.symbol, k.interval, candle, k.is_closed))
    }

    fn stream_name(stream: &KlineStream) -> String {
        format!("{}@kline_{}", stream.symbol.to_lowercase(), stream.interval)
    }
}

impl MessageParser for BinanceParser {
    fn endpoint(&self) -> &str {
        BINANCE_WSS_BASE_ENDPOINT
    }

    fn fallback_endpoint(&self) -> Option<&str> {
        Some(BINANCE_WSS_FALLBACK_ENDPOINT)
    }

    fn name(&self) -> &'static str {
        "Binance"
    }

    fn format_subscribe(&self, stream: &KlineStream) -> String {
        json!({
            "method": "SUBSCRIBE",
            "params": [Self::stream_name(stream)],
            "id": 1,
        })
        .to_string()
    }

    fn format_unsubscribe(&self, stream: &KlineStream) -> String {
        json!({
            "method": "UNSUBSCRIBE",
            "params": [Self::stream_name(stream)],
            "id": 1,
        })
        .to_string()
    }

    fn parse_message(&self, msg: &str) -> Option<KlineEvent> {
        // Detect message type by "e" field; everything else is a control message
        if !msg.contains(r#""e":"kline""#) {
            return None;
        }

        match self.parse_kline(msg) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "dropping kline message");
                None
            }
        }
    }
}

/// Parses the `/api/v3/klines` response body.
///
/// Each row is `[open_time, "open", "high", "low", "close", "volume", close_time, ...]`.
pub fn parse_rest_klines(body: &str) -> anyhow::Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body).context("klines response is not an array of rows")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let open_time = row
                .first()
                .and_then(Value::as_u64)
                .with_context(|| format!("row {i}: missing open time"))?;

            let mut fields = [""; 5];
            for (offset, slot) in fields.iter_mut().enumerate() {
                *slot = row
                    .get(offset + 1)
                    .and_then(Value::as_str)
                    .with_context(|| format!("row {i}: missing field {}", offset + 1))?;
            }
            candle_from_parts(open_time, fields).with_context(|| format!("row {i}"))
        })
        .collect()
}

/// Fetches the most recent `limit` candles, oldest first.
pub async fn fetch_klines(
    client: &reqwest::Client,
    symbol: &str,
    interval: Timeframe,
    limit: usize,
) -> anyhow::Result<Vec<Candle>> {
    let limit = limit.clamp(1, MAX_KLINES_PER_REQUEST);
    let url = format!("{BINANCE_REST_BASE_ENDPOINT}/api/v3/klines");

    let body = client
        .get(&url)
        .query(&[
            ("symbol", symbol.to_uppercase()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ])
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .context("Binance rejected klines request")?
        .text()
        .await
        .context("failed to read klines response")?;

    let candles = parse_rest_klines(&body)?;
    debug!(symbol, %interval, count = candles.len(), "fetched kline history");
    Ok(candles)
}

pub type BinanceClient = WebSocketClient<BinanceParser>;

pub fn new_binance_client() -> BinanceClient {
    WebSocketClient::new(BinanceParser::new())
}
