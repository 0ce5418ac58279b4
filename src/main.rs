use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use market_sentinel::market::{CandleWindow, KlineStream, fetch_klines, new_binance_client};
use market_sentinel::{Analyzer, DashboardConfig};

/// Reconnect when the stream has been silent this long.
const STALE_STREAM: Duration = Duration::from_secs(60);

fn init_tracing(config: &DashboardConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::load_from_env()?;
    init_tracing(&config);

    info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        history = config.history_limit,
        "starting market sentinel"
    );

    let analyzer = Analyzer::new(config.detector.clone(), config.indicators.clone())
        .context("invalid detector or indicator config")?;

    let http = reqwest::Client::new();
    let history = fetch_klines(&http, &config.symbol, config.timeframe, config.history_limit)
        .await
        .context("failed to load kline history")?;
    let mut window = CandleWindow::from_history(config.history_limit, history);
    info!(candles = window.len(), "history loaded");

    let mut client = new_binance_client();
    let mut events = client
        .connect()
        .await?
        .context("client did not hand out an event receiver")?;
    client
        .subscribe(KlineStream::new(config.symbol.clone(), config.timeframe))
        .await?;

    let mut ticker = interval(config.refresh_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_event = Instant::now();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                last_event = Instant::now();
                let outcome = window.apply(&event);
                debug!(open_time = event.open_time(), closed = event.is_closed, ?outcome, "kline");
            }
            _ = ticker.tick() => {
                let stale = last_event.elapsed() > STALE_STREAM;
                if client.needs_reconnect() || stale {
                    match client.reconnect().await {
                        Ok(()) => last_event = Instant::now(),
                        Err(e) => warn!(error = %e, stale, "reconnect failed, retrying next cycle"),
                    }
                }

                match analyzer.analyze(&window.to_series()) {
                    Ok(analysis) => {
                        let summary = analysis.summary();
                        info!(
                            close = ?summary.last_close,
                            signal = %analysis.signal.action,
                            score = analysis.signal.score,
                            confidence = summary.confidence,
                            anomalies = analysis.report.total_anomalies,
                            reasons = ?analysis.signal.labels(),
                            "refresh"
                        );
                        debug!(report = %serde_json::to_string(&summary)?, "analysis");
                    }
                    // Skip this cycle; the next tick sees a fresh window
                    Err(e) => error!(error = %e, "analysis failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    client.disconnect().await;
    Ok(())
}
