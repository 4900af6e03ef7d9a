//! Live request updates over socket.io.
//!
//! The backend pushes request events through socket.io (Engine.IO v4 over
//! WebSocket). [`RealtimeListener`] performs the handshake, joins the
//! default namespace, answers heartbeats, and forwards parsed
//! [`RealtimeMessage`]s to the application. It reconnects with exponential
//! backoff and stops once the receiving side of its channel is dropped.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};
use tungstenite::Message as WsMessage;

use crate::models::ServiceRequest;
use crate::{ConciergeError, Result};

/// Initial backoff duration between reconnection attempts.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff duration between reconnection attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Engine.IO handshake path.
const SOCKET_IO_PATH: &str = "/socket.io/";

/// Event emitted when a request is created.
const EVENT_CREATED: &str = "nueva-solicitud";

/// Event emitted when staff update a request.
const EVENT_UPDATED: &str = "solicitud-actualizada";

/// Write half of a push-socket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Read half of a push-socket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Request event pushed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEvent {
    Created(ServiceRequest),
    Updated(ServiceRequest),
}

impl RequestEvent {
    /// The request carried by the event.
    pub fn request(&self) -> &ServiceRequest {
        match self {
            Self::Created(r) | Self::Updated(r) => r,
        }
    }
}

/// A decoded socket.io text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO open (`0{...}`); the client must join a namespace next.
    Open,
    /// Engine.IO ping (`2`); must be answered with a pong (`3`).
    Ping,
    /// Namespace joined (`40`).
    Connected,
    /// Engine close (`1`), namespace disconnect (`41`) or refused connect (`44`).
    Disconnect,
    /// A request event (`42["nueva-solicitud", {...}]`).
    Event(RequestEvent),
    /// Anything else: pongs, noops, events this client does not follow.
    Ignored,
}

/// What the listener reports to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeMessage {
    Connected,
    Disconnected,
    Event(RequestEvent),
}

/// Why the reader loop exited.
enum DisconnectReason {
    ConnectionError,
    Shutdown,
}

/// Builds the socket.io WebSocket URL scoped to a property:
/// `ws(s)://host/socket.io/?EIO=4&transport=websocket&propiedad={property}`.
///
/// `http`/`https` bases are mapped to `ws`/`wss`.
///
/// # Errors
///
/// Returns [`ConciergeError::Config`] if `base` is not an http(s) or ws(s) URL.
pub fn feed_url(base: &str, property: &str) -> Result<String> {
    let invalid = || ConciergeError::Config(format!("invalid socket URL {base}"));

    let mut url = reqwest::Url::parse(base).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(invalid()),
    };
    url.set_scheme(scheme).map_err(|()| invalid())?;
    url.set_path(SOCKET_IO_PATH);
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket")
        .append_pair("propiedad", property);

    Ok(url.into())
}

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns [`ConciergeError::WebSocket`] if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Decodes one socket.io text frame.
///
/// # Errors
///
/// Returns [`ConciergeError::MalformedMessage`] if a followed event does not
/// carry a valid request, or an event frame is not a JSON array.
pub fn parse_packet(text: &str) -> Result<Packet> {
    let mut chars = text.chars();
    let packet = match chars.next() {
        Some('0') => Packet::Open,
        Some('1') => Packet::Disconnect,
        Some('2') => Packet::Ping,
        Some('4') => match chars.next() {
            Some('0') => Packet::Connected,
            Some('1' | '4') => Packet::Disconnect,
            Some('2') => parse_event(&text[2..])?,
            _ => Packet::Ignored,
        },
        _ => Packet::Ignored,
    };
    Ok(packet)
}

/// Parses the body of an event packet: `[/ns,][ackId]["name", data]`.
fn parse_event(body: &str) -> Result<Packet> {
    let body = match body.strip_prefix('/') {
        Some(rest) => rest.split_once(',').map_or("", |(_, payload)| payload),
        None => body,
    };
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());

    let malformed = |e: serde_json::Error| ConciergeError::MalformedMessage(e.to_string());
    let mut args: Vec<serde_json::Value> = serde_json::from_str(body).map_err(malformed)?;
    if args.len() < 2 {
        return Err(ConciergeError::MalformedMessage(
            "event packet without name and payload".to_string(),
        ));
    }
    let data = args.swap_remove(1);
    let serde_json::Value::String(name) = args.swap_remove(0) else {
        return Err(ConciergeError::MalformedMessage(
            "event name is not a string".to_string(),
        ));
    };

    let event = match name.as_str() {
        EVENT_CREATED => RequestEvent::Created(serde_json::from_value(data).map_err(malformed)?),
        EVENT_UPDATED => RequestEvent::Updated(serde_json::from_value(data).map_err(malformed)?),
        _ => return Ok(Packet::Ignored),
    };
    Ok(Packet::Event(event))
}

/// Keeps the push socket connected and forwards request events.
pub struct RealtimeListener {
    url: String,
    tx: mpsc::UnboundedSender<RealtimeMessage>,
}

impl RealtimeListener {
    /// Creates a listener for a URL built with [`feed_url`], reporting on `tx`.
    #[must_use]
    pub fn new(url: String, tx: mpsc::UnboundedSender<RealtimeMessage>) -> Self {
        Self { url, tx }
    }

    /// Runs until the receiver is dropped.
    ///
    /// Connects, joins the namespace, reads frames, and reconnects with
    /// exponential backoff after every failure. The backoff resets once the
    /// namespace has been joined.
    pub async fn run(self) {
        let mut backoff = INITIAL_BACKOFF;

        loop {
            if self.tx.is_closed() {
                info!("Realtime listener shutting down");
                return;
            }

            info!(url = %self.url, "Connecting to request feed");
            let (write, read) = match connect(&self.url).await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "Connection failed");
                    if self.tx.send(RealtimeMessage::Disconnected).is_err() {
                        return;
                    }
                    info!(backoff_secs = backoff.as_secs(), "Backing off before retry");
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                    continue;
                }
            };

            let mut joined = false;
            match self.read_loop(write, read, &mut joined).await {
                DisconnectReason::ConnectionError => {
                    if joined {
                        backoff = INITIAL_BACKOFF;
                    }
                    if self.tx.send(RealtimeMessage::Disconnected).is_err() {
                        return;
                    }
                    info!(
                        backoff_secs = backoff.as_secs(),
                        "Connection lost, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                }
                DisconnectReason::Shutdown => {
                    info!("Realtime listener shutting down");
                    return;
                }
            }
        }
    }

    async fn read_loop(
        &self,
        mut write: WsWriter,
        mut read: WsReader,
        joined: &mut bool,
    ) -> DisconnectReason {
        loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(WsMessage::Text(text))) => text,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            return DisconnectReason::ConnectionError;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return DisconnectReason::ConnectionError;
                        }
                    };

                    let packet = match parse_packet(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            debug!(error = %e, "Ignoring frame");
                            continue;
                        }
                    };

                    match packet {
                        Packet::Open => {
                            if let Err(e) = write.send(WsMessage::Text("40".into())).await {
                                warn!(error = %e, "Namespace connect failed");
                                return DisconnectReason::ConnectionError;
                            }
                        }
                        Packet::Ping => {
                            if let Err(e) = write.send(WsMessage::Text("3".into())).await {
                                warn!(error = %e, "Pong failed");
                                return DisconnectReason::ConnectionError;
                            }
                        }
                        Packet::Connected => {
                            *joined = true;
                            info!("Joined request feed");
                            if self.tx.send(RealtimeMessage::Connected).is_err() {
                                return DisconnectReason::Shutdown;
                            }
                        }
                        Packet::Disconnect => {
                            warn!("Server closed the request feed");
                            return DisconnectReason::ConnectionError;
                        }
                        Packet::Event(event) => {
                            debug!(id = %event.request().id, "Request event received");
                            if self.tx.send(RealtimeMessage::Event(event)).is_err() {
                                return DisconnectReason::Shutdown;
                            }
                        }
                        Packet::Ignored => {}
                    }
                }

                () = self.tx.closed() => {
                    return DisconnectReason::Shutdown;
                }
            }
        }
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestKind, RequestStatus};

    const REQUEST: &str = r#"{
        "_id": "r1",
        "tipo": "Amenidades",
        "items": ["Toallas"],
        "estado": "enviada",
        "propiedad": "Casa YV 19",
        "nombre": "Ana"
    }"#;

    #[test]
    fn backoff_doubles_up_to_a_minute() {
        let mut backoff = INITIAL_BACKOFF;
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(backoff.as_secs());
            backoff = next_backoff(backoff);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn feed_url_targets_socket_io_endpoint() {
        let url = feed_url("https://api.example.com", "Casa YV 19").unwrap();
        assert_eq!(
            url,
            "wss://api.example.com/socket.io/?EIO=4&transport=websocket&propiedad=Casa+YV+19"
        );

        let url = feed_url("http://localhost:4000", "x").unwrap();
        assert!(url.starts_with("ws://localhost:4000/socket.io/?EIO=4"));

        assert!(feed_url("not a url", "x").is_err());
        assert!(feed_url("ftp://example.com", "x").is_err());
    }

    #[test]
    fn decodes_control_packets() {
        assert_eq!(
            parse_packet(r#"0{"sid":"abc","pingInterval":25000,"pingTimeout":20000}"#).unwrap(),
            Packet::Open
        );
        assert_eq!(parse_packet("2").unwrap(), Packet::Ping);
        assert_eq!(parse_packet("3").unwrap(), Packet::Ignored);
        assert_eq!(parse_packet(r#"40{"sid":"xyz"}"#).unwrap(), Packet::Connected);
        assert_eq!(parse_packet("41").unwrap(), Packet::Disconnect);
        assert_eq!(
            parse_packet(r#"44{"message":"unauthorized"}"#).unwrap(),
            Packet::Disconnect
        );
        assert_eq!(parse_packet("1").unwrap(), Packet::Disconnect);
        assert_eq!(parse_packet("6").unwrap(), Packet::Ignored);
        assert_eq!(parse_packet("").unwrap(), Packet::Ignored);
    }

    #[test]
    fn decodes_created_event() {
        let frame = format!(r#"42["nueva-solicitud",{REQUEST}]"#);
        let Packet::Event(RequestEvent::Created(request)) = parse_packet(&frame).unwrap() else {
            panic!("expected created event");
        };
        assert_eq!(request.kind, RequestKind::Amenities);
        assert_eq!(request.status, RequestStatus::Sent);
    }

    #[test]
    fn decodes_event_with_namespace_and_ack_id() {
        let frame = format!(r#"42/,17["solicitud-actualizada",{REQUEST}]"#);
        assert!(matches!(
            parse_packet(&frame).unwrap(),
            Packet::Event(RequestEvent::Updated(_))
        ));
    }

    #[test]
    fn other_events_are_ignored_and_bad_payloads_rejected() {
        assert_eq!(
            parse_packet(r#"42["chat",{"text":"hola"}]"#).unwrap(),
            Packet::Ignored
        );
        assert!(matches!(
            parse_packet(r#"42["nueva-solicitud",{"_id":1}]"#),
            Err(ConciergeError::MalformedMessage(_))
        ));
        assert!(parse_packet("42not json").is_err());
        assert!(parse_packet(r#"42["nueva-solicitud"]"#).is_err());
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let listener = RealtimeListener::new("ws://127.0.0.1:9".to_string(), tx);
        tokio::time::timeout(Duration::from_secs(5), listener.run())
            .await
            .unwrap();
    }
}
