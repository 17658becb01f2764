//! WebSocket Push Transport
//!
//! Connects to the push endpoint, forwards decoded frames onto the session
//! event queue and reconnects with exponential backoff. Connects and
//! disconnects are reported as [`PushMessage::Connect`] and
//! [`PushMessage::Disconnect`] so the session can drive its channel state.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::messages::PushMessage;
use crate::error::ChannelError;
use crate::event::{DashboardEvent, EventSender};

/// Push transport settings
#[derive(Debug, Clone)]
pub struct PushTransportConfig {
    pub url: String,
    /// Delay before the first reconnect attempt
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
    /// Give up after this many consecutive failures; `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for PushTransportConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:5000/ws".to_string(),
            reconnect_base: Duration::from_millis(1000),
            reconnect_max: Duration::from_millis(30000),
            max_reconnect_attempts: None,
        }
    }
}

/// Backoff before reconnect attempt `attempt` (zero-based)
pub fn reconnect_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt)).min(max)
}

/// How a connected session ended
enum SessionEnd {
    Cancelled,
    /// Event queue closed; nobody is listening any more
    QueueClosed,
    Closed(Option<String>),
}

/// WebSocket client feeding the session event queue
pub struct WsPushTransport {
    config: PushTransportConfig,
}

impl WsPushTransport {
    pub fn new(config: PushTransportConfig) -> Self {
        Self { config }
    }

    /// Run the connect/reconnect loop in the background
    pub fn spawn(
        self,
        events: EventSender,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<(), ChannelError>> {
        tokio::spawn(async move { self.run(events, cancel).await })
    }

    /// Connect/reconnect loop; returns when cancelled or out of attempts
    pub async fn run(
        &self,
        events: EventSender,
        cancel: CancellationToken,
    ) -> Result<(), ChannelError> {
        let mut attempts: u32 = 0;

        loop {
            let connected = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                result = connect_async(self.config.url.as_str()) => result,
            };

            match connected {
                Ok((stream, _response)) => {
                    attempts = 0;
                    tracing::info!(url = %self.config.url, "Push channel connected");

                    if events.send(DashboardEvent::Push(PushMessage::Connect)).is_err() {
                        return Ok(());
                    }

                    match self.pump(stream, &events, &cancel).await {
                        SessionEnd::Cancelled | SessionEnd::QueueClosed => return Ok(()),
                        SessionEnd::Closed(reason) => {
                            let error = ChannelError::Disconnected(
                                reason.clone().unwrap_or_else(|| "closed".to_string()),
                            );
                            tracing::warn!(error = %error, "Push channel lost");

                            let disconnect = PushMessage::Disconnect { reason };
                            if events.send(DashboardEvent::Push(disconnect)).is_err() {
                                return Ok(());
                            }
                        }
                    }
                }
                Err(e) => {
                    let error = ChannelError::Connect(e.to_string());
                    tracing::warn!(url = %self.config.url, attempt = attempts + 1, error = %error, "Push connect failed");
                }
            }

            if let Some(max) = self.config.max_reconnect_attempts {
                if attempts >= max {
                    let error = ChannelError::Exhausted(attempts);
                    tracing::error!(error = %error, "Push transport giving up");
                    return Err(error);
                }
            }

            let delay =
                reconnect_delay(attempts, self.config.reconnect_base, self.config.reconnect_max);
            attempts += 1;
            tracing::debug!(delay_ms = delay.as_millis() as u64, attempt = attempts, "Scheduling reconnect");

            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Forward frames until the connection ends
    async fn pump(
        &self,
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Cancelled;
                }
                frame = read.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => match PushMessage::from_frame_text(text.as_str()) {
                    Ok(update @ PushMessage::Update { .. }) => {
                        if events.send(DashboardEvent::Push(update)).is_err() {
                            return SessionEnd::QueueClosed;
                        }
                    }
                    Ok(other) => {
                        tracing::debug!(event = other.event_name(), "Ignoring lifecycle frame from server");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping push frame");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        return SessionEnd::Closed(Some(e.to_string()));
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    return SessionEnd::Closed(frame.map(|f| f.reason.as_str().to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Closed(Some(e.to_string())),
                None => return SessionEnd::Closed(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;
    use crate::model::Topic;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn test_reconnect_delay_backoff() {
        let base = Duration::from_millis(1000);
        let max = Duration::from_millis(30000);

        assert_eq!(reconnect_delay(0, base, max), Duration::from_millis(1000));
        assert_eq!(reconnect_delay(1, base, max), Duration::from_millis(2000));
        assert_eq!(reconnect_delay(4, base, max), Duration::from_millis(16000));
        assert_eq!(reconnect_delay(5, base, max), max);
        assert_eq!(reconnect_delay(40, base, max), max);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = WsPushTransport::new(PushTransportConfig {
            url: format!("ws://{}", addr),
            reconnect_base: Duration::from_millis(1),
            reconnect_max: Duration::from_millis(5),
            max_reconnect_attempts: Some(2),
        });
        let (tx, mut rx) = event::channel();

        let result = transport.run(tx, CancellationToken::new()).await;

        assert!(matches!(result, Err(ChannelError::Exhausted(2))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forwards_frames_and_reports_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(Message::text(
                json!({"event": "status", "data": {"msg": "Connected to server"}}).to_string(),
            ))
            .await
            .unwrap();
            ws.send(Message::text(
                json!({"event": "stats_update", "data": {"total_articles": 125}}).to_string(),
            ))
            .await
            .unwrap();
            ws.send(Message::text("garbage")).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let cancel = CancellationToken::new();
        let (tx, mut rx) = event::channel();
        let handle = WsPushTransport::new(PushTransportConfig {
            url: format!("ws://{}", addr),
            reconnect_base: Duration::from_secs(60),
            ..Default::default()
        })
        .spawn(tx, cancel.clone());

        let mut received = Vec::new();
        while received.len() < 3 {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Some(DashboardEvent::Push(msg))) => received.push(msg),
                other => panic!("Expected push event, got {:?}", other),
            }
        }

        assert_eq!(received[0], PushMessage::Connect);
        assert_eq!(
            received[1],
            PushMessage::Update {
                topic: Topic::Stats,
                payload: json!({"total_articles": 125}),
            }
        );
        assert!(matches!(received[2], PushMessage::Disconnect { .. }));

        cancel.cancel();
        assert!(handle.await.unwrap().is_ok());
        server.await.unwrap();
    }
}
