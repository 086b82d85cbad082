/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::codec::Serialization;
use crate::data_plane::connection::Connection;
use crate::data_plane::inbound_pump::run_inbound_pump;
use crate::data_plane::outbound_pump::run_outbound_pump;
use crate::data_plane::outbound_queue::{BackpressurePolicy, OutboundQueue};
use crate::data_plane::shutdown::ShutdownSignal;
use crate::error::PeerError;
use crate::message::Message;
use crate::observability::events;
use crate::observability::fields::{PeerContext, PeerRole};
use crate::runtime::pump_runtime::spawn_pump;
use crate::sender::{Peer, Sender};
use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

const COMPONENT: &str = "websocket_peer";

/// Queue sizes and close deadline for one transport peer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    pub outbound_queue_size: usize,
    pub inbound_queue_size: usize,
    #[serde(rename = "close_timeout_ms", with = "duration_millis")]
    pub close_timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            outbound_queue_size: 10,
            inbound_queue_size: 10,
            close_timeout: Duration::from_secs(5),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Backpressure used by each side of the handshake.
///
/// A dialing peer keeps the connection alive and may wait; an accepting peer
/// serves a shared broker and must never stall it.
pub fn backpressure_for(role: PeerRole) -> BackpressurePolicy {
    match role {
        PeerRole::Dialer => BackpressurePolicy::Block,
        PeerRole::Acceptor => BackpressurePolicy::Drop,
    }
}

/// Picks the first client-offered subprotocol this peer can serve.
pub(crate) fn select_subprotocol(headers: &HeaderMap) -> Option<Serialization> {
    headers
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(Serialization::from_subprotocol)
}

fn verify_agreed(headers: &HeaderMap, requested: Serialization) -> Result<(), PeerError> {
    let agreed = headers
        .get(SEC_WEBSOCKET_PROTOCOL)
        .ok_or(PeerError::NoSubprotocol)?
        .to_str()
        .map_err(|_| PeerError::NoSubprotocol)?;

    match Serialization::from_subprotocol(agreed) {
        Some(serialization) if serialization == requested => Ok(()),
        _ => Err(PeerError::UnsupportedSubprotocol(agreed.to_string())),
    }
}

///
/// [`WebSocketPeer`] is one live WebSocket connection carrying WAMP messages.
///
/// Construction splits the socket and spawns two pumps on the current tokio
/// runtime. The inbound pump decodes frames into the queue read by
/// [`Peer::receive`]; the outbound pump writes whatever [`Sender::send`] enqueued,
/// one frame per message, in enqueue order.
///
/// Dialing peers use [`BackpressurePolicy::Block`]; accepting peers use
/// [`BackpressurePolicy::Drop`]. In both cases `send` reports success: a dropped
/// or shut-down message is logged, not surfaced.
pub struct WebSocketPeer<S> {
    connection: Arc<Connection<SplitSink<WebSocketStream<S>, WsMessage>>>,
    outbound: OutboundQueue,
    inbound: Mutex<mpsc::Receiver<Message>>,
    shutdown: ShutdownSignal,
    close_requested: AtomicBool,
    context: PeerContext,
    serialization: Serialization,
}

impl<S> WebSocketPeer<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already-upgraded socket and starts both pumps.
    pub fn from_stream(
        socket: WebSocketStream<S>,
        serialization: Serialization,
        role: PeerRole,
        config: PeerConfig,
    ) -> Self {
        let context = PeerContext::new(role);
        let shutdown = ShutdownSignal::new();
        let policy = backpressure_for(role);
        let (writer, reader) = socket.split();

        let connection = Arc::new(Connection::new(
            writer,
            shutdown.clone(),
            context.clone(),
            config.close_timeout,
        ));
        let (outbound, outbound_queue) = OutboundQueue::channel(
            config.outbound_queue_size,
            policy,
            shutdown.clone(),
            context.clone(),
        );
        let (inbound_sender, inbound) = mpsc::channel(config.inbound_queue_size.max(1));
        let serializer = serialization.serializer();

        spawn_pump(
            "inbound",
            &context,
            run_inbound_pump(reader, connection.clone(), serializer.clone(), inbound_sender),
        );
        spawn_pump(
            "outbound",
            &context,
            run_outbound_pump(
                outbound_queue,
                connection.clone(),
                serializer,
                serialization.payload_type(),
            ),
        );

        info!(
            event = events::PEER_OPEN,
            component = COMPONENT,
            peer_id = context.peer_id.as_str(),
            role = %context.role,
            subprotocol = serialization.subprotocol(),
            backpressure = ?policy,
            "websocket peer open"
        );

        Self {
            connection,
            outbound,
            inbound: Mutex::new(inbound),
            shutdown,
            close_requested: AtomicBool::new(false),
            context,
            serialization,
        }
    }

    /// Upgrades an accepted stream, agreeing on the first supported offered subprotocol.
    ///
    /// The handshake is rejected with `400 Bad Request` when the client offers none.
    pub async fn accept(stream: S, config: PeerConfig) -> Result<Self, PeerError> {
        let mut selected = None;
        let callback = |request: &Request, mut response: Response| {
            let Some(serialization) = select_subprotocol(request.headers()) else {
                warn!(
                    event = events::PEER_HANDSHAKE_REJECTED,
                    component = COMPONENT,
                    offered = ?request.headers().get_all(SEC_WEBSOCKET_PROTOCOL),
                    "no supported serialization subprotocol offered"
                );
                let mut rejection = ErrorResponse::new(Some(
                    "no supported serialization subprotocol offered".to_string(),
                ));
                *rejection.status_mut() = StatusCode::BAD_REQUEST;
                return Err(rejection);
            };

            response.headers_mut().insert(
                SEC_WEBSOCKET_PROTOCOL,
                HeaderValue::from_static(serialization.subprotocol()),
            );
            selected = Some(serialization);
            Ok(response)
        };

        let accepted = tokio_tungstenite::accept_hdr_async(stream, callback).await;
        let socket = match accepted {
            Ok(socket) => socket,
            Err(WsError::Http(_)) if selected.is_none() => return Err(PeerError::NoSubprotocol),
            Err(err) => return Err(PeerError::Transport(err)),
        };
        let serialization = selected.ok_or(PeerError::NoSubprotocol)?;

        Ok(Self::from_stream(
            socket,
            serialization,
            PeerRole::Acceptor,
            config,
        ))
    }

    /// Performs the client handshake over an established stream.
    ///
    /// Offers exactly one subprotocol and fails unless the server agrees on it.
    pub async fn dial_stream(
        url: &str,
        stream: S,
        serialization: Serialization,
        config: PeerConfig,
    ) -> Result<Self, PeerError> {
        let mut request = url.into_client_request()?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(serialization.subprotocol()),
        );

        let (socket, response) = tokio_tungstenite::client_async(request, stream).await?;
        verify_agreed(response.headers(), serialization)?;

        Ok(Self::from_stream(
            socket,
            serialization,
            PeerRole::Dialer,
            config,
        ))
    }

    pub fn peer_id(&self) -> &str {
        &self.context.peer_id
    }

    pub fn role(&self) -> PeerRole {
        self.context.role
    }

    pub fn serialization(&self) -> Serialization {
        self.serialization
    }

    pub fn backpressure(&self) -> BackpressurePolicy {
        self.outbound.policy()
    }
}

impl WebSocketPeer<MaybeTlsStream<TcpStream>> {
    /// Dials `url` over TCP (or TLS when the crate's TLS features are enabled).
    pub async fn connect(
        url: &str,
        serialization: Serialization,
        config: PeerConfig,
    ) -> Result<Self, PeerError> {
        let mut request = url.into_client_request()?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(serialization.subprotocol()),
        );

        let (socket, response) = tokio_tungstenite::connect_async(request).await?;
        verify_agreed(response.headers(), serialization)?;

        Ok(Self::from_stream(
            socket,
            serialization,
            PeerRole::Dialer,
            config,
        ))
    }
}

#[async_trait]
impl<S> Sender for WebSocketPeer<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&self, message: Message) -> Result<(), PeerError> {
        self.outbound.enqueue(message).await;
        Ok(())
    }
}

#[async_trait]
impl<S> Peer for WebSocketPeer<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn receive(&self) -> Option<Message> {
        self.inbound.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), PeerError> {
        if self.close_requested.swap(true, Ordering::AcqRel) {
            debug!(
                event = events::PEER_CLOSE_REPEATED,
                component = COMPONENT,
                peer_id = self.context.peer_id.as_str(),
                role = %self.context.role,
                "close already requested"
            );
            return Ok(());
        }

        info!(
            event = events::PEER_CLOSE_REQUESTED,
            component = COMPONENT,
            peer_id = self.context.peer_id.as_str(),
            role = %self.context.role,
            "closing websocket peer"
        );
        self.shutdown.fire();
        self.connection.write_close_frame().await;
        self.connection.teardown().await
    }
}

impl<S> Drop for WebSocketPeer<S> {
    fn drop(&mut self) {
        self.shutdown.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::{backpressure_for, select_subprotocol, verify_agreed, PeerConfig};
    use crate::codec::Serialization;
    use crate::data_plane::outbound_queue::BackpressurePolicy;
    use crate::error::PeerError;
    use crate::observability::fields::PeerRole;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
    use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderValue};

    fn offered(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for &value in values {
            headers.append(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn acceptor_picks_first_supported_offer() {
        assert_eq!(
            select_subprotocol(&offered(&["wamp.2.cbor, wamp.2.msgpack, wamp.2.json"])),
            Some(Serialization::MessagePack)
        );
        assert_eq!(
            select_subprotocol(&offered(&["wamp.2.cbor", "wamp.2.json"])),
            Some(Serialization::Json)
        );
        assert_eq!(select_subprotocol(&offered(&["mqtt"])), None);
        assert_eq!(select_subprotocol(&HeaderMap::new()), None);
    }

    #[test]
    fn dialer_requires_the_requested_subprotocol() {
        assert!(verify_agreed(&offered(&["wamp.2.json"]), Serialization::Json).is_ok());
        assert!(matches!(
            verify_agreed(&HeaderMap::new(), Serialization::Json),
            Err(PeerError::NoSubprotocol)
        ));
        assert!(matches!(
            verify_agreed(&offered(&["wamp.2.msgpack"]), Serialization::Json),
            Err(PeerError::UnsupportedSubprotocol(agreed)) if agreed == "wamp.2.msgpack"
        ));
    }

    #[test]
    fn roles_pick_their_backpressure() {
        assert_eq!(backpressure_for(PeerRole::Dialer), BackpressurePolicy::Block);
        assert_eq!(backpressure_for(PeerRole::Acceptor), BackpressurePolicy::Drop);
    }

    #[test]
    fn peer_config_defaults_and_overrides() {
        let defaults = PeerConfig::default();
        assert_eq!(defaults.outbound_queue_size, 10);
        assert_eq!(defaults.inbound_queue_size, 10);
        assert_eq!(defaults.close_timeout, Duration::from_secs(5));

        let parsed: PeerConfig =
            serde_json::from_str(r#"{"outbound_queue_size": 64, "close_timeout_ms": 250}"#)
                .expect("config should parse");
        assert_eq!(parsed.outbound_queue_size, 64);
        assert_eq!(parsed.inbound_queue_size, 10);
        assert_eq!(parsed.close_timeout, Duration::from_millis(250));

        assert!(serde_json::from_str::<PeerConfig>(r#"{"queue": 1}"#).is_err());
    }
}
