//! Read-only WebSocket stream with automatic reconnection

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Outcome of one connection attempt
enum StreamEnd {
    /// Shutdown requested or consumer gone
    Stop,
    /// Server closed the socket; reconnect without counting a failure
    Closed,
}

/// WebSocket stream client with backoff reconnection and ping keepalive
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect in a background task and return the event receiver
    ///
    /// The task stops when `shutdown` fires, when the receiver is dropped,
    /// or when the reconnect budget is exhausted; `Disconnected` is sent last.
    pub fn connect(&self, shutdown: broadcast::Receiver<()>) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, tx, shutdown).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        rx
    }

    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), WsError> {
        let mut failures = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            let result = tokio::select! {
                _ = shutdown.recv() => Ok(StreamEnd::Stop),
                result = Self::connect_and_stream(&config, &tx) => result,
            };

            match result {
                Ok(StreamEnd::Stop) => break,
                Ok(StreamEnd::Closed) => {
                    tracing::info!("WebSocket closed by server, reconnecting");
                    failures = 0;
                    reconnect_delay = config.initial_reconnect_delay;
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(error = %e, attempt = failures, "WebSocket connection error");

                    if config.max_reconnect_attempts > 0
                        && failures >= config.max_reconnect_attempts
                    {
                        let _ = tx.send(WsMessage::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }
                }
            }

            if tx.is_closed() {
                break;
            }
            let _ = tx.send(WsMessage::Reconnecting { attempt: failures }).await;

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = sleep(reconnect_delay) => {}
            }
            reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
        }

        let _ = tx.send(WsMessage::Disconnected).await;
        Ok(())
    }

    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
    ) -> Result<StreamEnd, WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(StreamEnd::Stop);
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                msg = read.next() => {
                    last_seen = Instant::now();
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                return Ok(StreamEnd::Stop);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Close(_))) => return Ok(StreamEnd::Closed),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(WsError::ConnectionFailed(e.to_string())),
                        None => {
                            return Err(WsError::ConnectionFailed(
                                "Stream ended unexpectedly".into(),
                            ))
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    if last_seen.elapsed() > config.idle_timeout {
                        return Err(WsError::Idle(config.idle_timeout));
                    }
                    write.send(Message::Ping(Vec::new())).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                }
            }
        }
    }
}
