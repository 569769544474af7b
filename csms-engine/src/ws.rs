//! WebSocket transport adapter
//!
//! Implements [`Transport`] over a single OCPP-J WebSocket link:
//! - subprotocol negotiation, station id appended to the endpoint path
//! - one pump task owning the socket: outgoing frames in, inbound frames
//!   demultiplexed by correlation id
//! - replies resolve their caller through a per-id oneshot slot, so
//!   out-of-order responses always reach the right dispatch
//! - inbound CALLs (station-originated requests) surface on a channel for
//!   the host to answer
//! - reconnect with exponential backoff; in-flight calls fail over to a
//!   transport outcome when the link drops

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        handshake::client::Request,
        http::{header, Uri},
        protocol::WebSocketConfig,
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use async_trait::async_trait;
use thiserror::Error;

use csms_wire::frame::{Call, Frame};
use csms_wire::ids::{EventTrackingId, RequestId};

use crate::transport::{DestinationMeta, SendOutcome, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for one station link
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Endpoint URL without the station id
    pub url: String,
    /// Station identity, appended to the URL path
    pub station_id: String,
    /// WebSocket subprotocol to negotiate
    pub subprotocol: String,
    pub max_message_size: usize,
    pub max_frame_size: usize,
    /// Initial reconnect delay
    pub reconnect_delay: Duration,
    /// Reconnect backoff cap
    pub max_reconnect_delay: Duration,
    /// Depth of the outgoing and inbound channels
    pub queue_depth: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:9220/ocpp".to_string(),
            station_id: "EK3-001".to_string(),
            subprotocol: "ocpp2.1".to_string(),
            max_message_size: 64 * 1024,
            max_frame_size: 16 * 1024,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_delay: Duration::from_secs(300),
            queue_depth: 64,
        }
    }
}

impl WsConfig {
    pub fn new(url: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            station_id: station_id.into(),
            ..Default::default()
        }
    }

    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = subprotocol.into();
        self
    }

    pub fn with_reconnect_delay(mut self, initial: Duration, max: Duration) -> Self {
        self.reconnect_delay = initial;
        self.max_reconnect_delay = max;
        self
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), self.station_id)
    }
}

/// Errors establishing the link
#[derive(Debug, Error)]
pub enum WsError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),
}

struct OutboundCall {
    call: Call,
    reply_tx: oneshot::Sender<SendOutcome>,
}

enum LinkEnd {
    /// The transport handle was dropped; stop the pump
    HostGone,
    /// The socket died; reconnect
    Lost,
}

/// WebSocket-backed [`Transport`]
pub struct WsTransport {
    outgoing_tx: mpsc::Sender<OutboundCall>,
}

impl WsTransport {
    /// Connect to the station endpoint and spawn the pump task.
    ///
    /// Returns the transport plus the stream of station-originated CALLs
    /// the host must answer. Fails fast if the first connection cannot be
    /// established; later drops reconnect with backoff.
    pub async fn connect(config: WsConfig) -> Result<(Self, mpsc::Receiver<Call>), WsError> {
        let socket = open_socket(&config).await?;

        let (outgoing_tx, outgoing_rx) = mpsc::channel(config.queue_depth);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.queue_depth);

        tokio::spawn(pump(config, socket, outgoing_rx, inbound_tx));

        Ok((Self { outgoing_tx }, inbound_rx))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(
        &self,
        call: Call,
        _meta: &DestinationMeta,
        _tracking: &EventTrackingId,
        timeout: Duration,
    ) -> SendOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();

        if self
            .outgoing_tx
            .send(OutboundCall { call, reply_tx })
            .await
            .is_err()
        {
            return SendOutcome::Transport {
                status: None,
                body: "websocket pump is gone".to_string(),
            };
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => SendOutcome::Transport {
                status: None,
                body: "connection lost before a reply arrived".to_string(),
            },
            Err(_) => SendOutcome::Transport {
                status: None,
                body: format!("no reply within {}ms", timeout.as_millis()),
            },
        }
    }
}

async fn open_socket(config: &WsConfig) -> Result<WsStream, WsError> {
    let endpoint = config.endpoint();
    let uri: Uri = endpoint
        .parse()
        .map_err(|_| WsError::InvalidUrl(endpoint.clone()))?;

    let request = Request::builder()
        .uri(&endpoint)
        .header(header::SEC_WEBSOCKET_PROTOCOL, &config.subprotocol)
        .header(header::HOST, uri.host().unwrap_or("localhost"))
        .body(())
        .map_err(|_| WsError::InvalidUrl(endpoint.clone()))?;

    let ws_config = WebSocketConfig {
        max_message_size: Some(config.max_message_size),
        max_frame_size: Some(config.max_frame_size),
        ..Default::default()
    };

    let (stream, response) = connect_async_with_config(request, Some(ws_config), false)
        .await
        .map_err(|e| WsError::Handshake(e.to_string()))?;

    let accepted = response
        .headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok());
    if accepted != Some(config.subprotocol.as_str()) {
        warn!(
            accepted = ?accepted,
            expected = %config.subprotocol,
            "station endpoint did not accept the requested subprotocol"
        );
    }

    info!(endpoint = %endpoint, "WebSocket connected");
    Ok(stream)
}

async fn pump(
    config: WsConfig,
    first: WsStream,
    mut outgoing_rx: mpsc::Receiver<OutboundCall>,
    inbound_tx: mpsc::Sender<Call>,
) {
    let mut pending: HashMap<RequestId, oneshot::Sender<SendOutcome>> = HashMap::new();
    let mut socket = Some(first);
    let mut delay = config.reconnect_delay;

    loop {
        let stream = match socket.take() {
            Some(stream) => stream,
            None => match open_socket(&config).await {
                Ok(stream) => {
                    delay = config.reconnect_delay;
                    stream
                }
                Err(e) => {
                    warn!(error = %e, "reconnect failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, config.max_reconnect_delay);
                    continue;
                }
            },
        };

        let end = run_link(stream, &mut outgoing_rx, &inbound_tx, &mut pending).await;

        // In-flight calls cannot survive the link they were sent on
        for (id, reply_tx) in pending.drain() {
            debug!(request_id = %id, "failing in-flight call after link loss");
            let _ = reply_tx.send(SendOutcome::Transport {
                status: None,
                body: "connection lost".to_string(),
            });
        }

        if let LinkEnd::HostGone = end {
            info!("transport handle dropped, stopping pump");
            return;
        }
    }
}

async fn run_link(
    stream: WsStream,
    outgoing_rx: &mut mpsc::Receiver<OutboundCall>,
    inbound_tx: &mpsc::Sender<Call>,
    pending: &mut HashMap<RequestId, oneshot::Sender<SendOutcome>>,
) -> LinkEnd {
    let (mut ws_tx, mut ws_rx) = stream.split();

    loop {
        tokio::select! {
            outbound = outgoing_rx.recv() => {
                let Some(OutboundCall { call, reply_tx }) = outbound else {
                    return LinkEnd::HostGone;
                };

                let bytes = match Frame::from(call.clone()).to_bytes() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(request_id = %call.id, error = %e, "failed to serialize frame");
                        let _ = reply_tx.send(SendOutcome::Transport {
                            status: None,
                            body: format!("frame serialization failed: {e}"),
                        });
                        continue;
                    }
                };

                let text = String::from_utf8_lossy(&bytes).into_owned();
                debug!(request_id = %call.id, action = %call.action, "sending frame");

                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    error!(error = %e, "WebSocket send failed");
                    let _ = reply_tx.send(SendOutcome::Transport {
                        status: None,
                        body: format!("websocket send failed: {e}"),
                    });
                    return LinkEnd::Lost;
                }

                pending.insert(call.id, reply_tx);
            }

            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(text.as_bytes(), pending, inbound_tx).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket closed by station");
                        return LinkEnd::Lost;
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // pong handled by tungstenite
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        return LinkEnd::Lost;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        return LinkEnd::Lost;
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn handle_frame(
    bytes: &[u8],
    pending: &mut HashMap<RequestId, oneshot::Sender<SendOutcome>>,
    inbound_tx: &mpsc::Sender<Call>,
) {
    match Frame::parse(bytes) {
        Ok(Frame::Result(result)) => match pending.remove(&result.id) {
            Some(reply_tx) => {
                let _ = reply_tx.send(SendOutcome::Reply(result.payload));
            }
            None => {
                warn!(request_id = %result.id, "result for unknown or already-resolved call");
            }
        },
        Ok(Frame::Error(fault)) => match pending.remove(&fault.id) {
            Some(reply_tx) => {
                let _ = reply_tx.send(SendOutcome::Fault(fault));
            }
            None => {
                warn!(request_id = %fault.id, "fault for unknown or already-resolved call");
            }
        },
        Ok(Frame::Call(call)) => {
            if inbound_tx.send(call).await.is_err() {
                warn!("host dropped the inbound channel; discarding station request");
            }
        }
        Err(e) => {
            warn!(error = %e, "unparsable frame from station");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_station_id() {
        let config = WsConfig::new("ws://localhost:9220/ocpp", "EK3-001");
        assert_eq!(config.endpoint(), "ws://localhost:9220/ocpp/EK3-001");

        let trailing = WsConfig::new("ws://localhost:9220/ocpp/", "EK3-001");
        assert_eq!(trailing.endpoint(), "ws://localhost:9220/ocpp/EK3-001");
    }

    #[test]
    fn test_default_subprotocol() {
        assert_eq!(WsConfig::default().subprotocol, "ocpp2.1");
    }
}
