//! Generic WebSocket client for exchange kline streams.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::market::kline::KlineEvent;
use crate::market::message_parser::MessageParser;
use crate::market::streams::KlineStream;

const OUTGOING_CAPACITY: usize = 100;
const EVENT_CAPACITY: usize = 1000;

/// WebSocket client that works with any exchange.
/// Exchange-specific logic is provided by the MessageParser implementation.
pub struct WebSocketClient<P: MessageParser> {
    parser: Arc<P>,
    subscriptions: Vec<KlineStream>,
    connected_at: Option<Instant>, // for 24h reconnection limit tracking
    is_connected: bool,
    ws_sender: Option<mpsc::Sender<String>>,
    // Kept across reconnects so consumers hold a single receiver.
    event_sender: Option<mpsc::Sender<KlineEvent>>,
}

impl<P: MessageParser> WebSocketClient<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser: Arc::new(parser),
            subscriptions: Vec::new(),
            connected_at: None,
            is_connected: false,
            ws_sender: None,
            event_sender: None,
        }
    }

    /// Sets the channel parsed kline events are delivered to.
    pub fn set_event_sender(&mut self, sender: mpsc::Sender<KlineEvent>) {
        self.event_sender = Some(sender);
    }

    pub fn name(&self) -> &'static str {
        self.parser.name()
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn subscriptions(&self) -> &[KlineStream] {
        &self.subscriptions
    }

    /// Checks if connection needs refresh (approaching 24h limit).
    pub fn needs_reconnect(&self) -> bool {
        if let Some(connected_at) = self.connected_at {
            let max_duration = Duration::from_secs(self.parser.max_connection_duration_secs());
            connected_at.elapsed() > max_duration
        } else {
            false
        }
    }

    async fn open(&self) -> anyhow::Result<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        let endpoint = self.parser.endpoint();
        info!(exchange = self.parser.name(), endpoint, "connecting");

        match connect_async(endpoint).await {
            Ok((ws_stream, _response)) => Ok(ws_stream),
            Err(primary_err) => {
                let Some(fallback) = self.parser.fallback_endpoint() else {
                    return Err(primary_err).with_context(|| format!("failed to connect to {endpoint}"));
                };
                warn!(
                    exchange = self.parser.name(),
                    error = %primary_err,
                    fallback,
                    "primary endpoint failed, trying fallback"
                );
                let (ws_stream, _response) = connect_async(fallback)
                    .await
                    .with_context(|| format!("failed to connect to {endpoint} and {fallback}"))?;
                Ok(ws_stream)
            }
        }
    }

    /// Connects to the WebSocket endpoint and spawns the read and write tasks.
    ///
    /// Returns the event receiver on the first connect. When an event sender
    /// already exists (set by the caller or kept from an earlier connection),
    /// events keep flowing to it and `None` is returned.
    pub async fn connect(&mut self) -> anyhow::Result<Option<mpsc::Receiver<KlineEvent>>> {
        let ws_stream = self.open().await?;
        let (write, read) = ws_stream.split();

        // Channel for sending messages TO the WebSocket
        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(OUTGOING_CAPACITY);
        self.ws_sender = Some(ws_tx);

        let (event_tx, event_rx) = match &self.event_sender {
            Some(sender) => (sender.clone(), None),
            None => {
                let (tx, rx) = mpsc::channel::<KlineEvent>(EVENT_CAPACITY);
                self.event_sender = Some(tx.clone());
                (tx, Some(rx))
            }
        };

        self.is_connected = true;
        self.connected_at = Some(Instant::now());

        let parser = Arc::clone(&self.parser);

        tokio::spawn(async move {
            let mut write = write;
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = write.send(Message::Text(msg.into())).await {
                    warn!(error = %e, "failed to send WebSocket message");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut read = read;
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        // Control messages (subscription confirmations, etc.) parse to None
                        if let Some(event) = parser.parse_message(&text) {
                            if event_tx.send(event).await.is_err() {
                                debug!(exchange = parser.name(), "event receiver dropped");
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(_)) => {
                        // Pong handled automatically by tungstenite
                        debug!(exchange = parser.name(), "ping received");
                    }
                    Ok(Message::Close(frame)) => {
                        info!(exchange = parser.name(), ?frame, "connection closed");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(exchange = parser.name(), error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            debug!(exchange = parser.name(), "read task ended");
        });

        info!(exchange = self.parser.name(), "connected");
        Ok(event_rx)
    }

    pub async fn subscribe(&mut self, stream: KlineStream) -> anyhow::Result<()> {
        let Some(sender) = self.ws_sender.as_ref().filter(|_| self.is_connected) else {
            bail!("{} is not connected", self.parser.name());
        };

        // each exchange has its own subscribe format
        let msg = self.parser.format_subscribe(&stream);
        sender.send(msg).await.context("WebSocket writer closed")?;
        info!(exchange = self.parser.name(), ?stream, "subscribed");
        self.subscriptions.push(stream);
        Ok(())
    }

    pub async fn unsubscribe(&mut self, stream: &KlineStream) -> anyhow::Result<()> {
        let Some(sender) = self.ws_sender.as_ref().filter(|_| self.is_connected) else {
            bail!("{} is not connected", self.parser.name());
        };

        let msg = self.parser.format_unsubscribe(stream);
        sender.send(msg).await.context("WebSocket writer closed")?;
        self.subscriptions.retain(|s| s != stream);
        info!(exchange = self.parser.name(), ?stream, "unsubscribed");
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.ws_sender = None;
        self.is_connected = false;
        self.connected_at = None;
        info!(exchange = self.parser.name(), "disconnected");
    }

    /// Reconnects and restores all subscriptions.
    pub async fn reconnect(&mut self) -> anyhow::Result<()> {
        info!(exchange = self.parser.name(), "reconnecting");

        let subs = std::mem::take(&mut self.subscriptions);
        self.disconnect().await;
        self.connect().await?;

        for stream in subs {
            self.subscribe(stream).await?;
        }

        info!(
            exchange = self.parser.name(),
            restored = self.subscriptions.len(),
            "reconnected"
        );
        Ok(())
    }
}
