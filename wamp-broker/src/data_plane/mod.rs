//! Data-plane layer.
//!
//! Owns the WebSocket transport peer: the shutdown signal, the bounded outbound
//! queue and its backpressure policy, the shared write half, and the inbound and
//! outbound pumps that move frames between the socket and the peer's queues.
//!
//! ```
//! use tokio::io::duplex;
//! use wamp_broker::{
//!     Message, Peer, PeerConfig, Sender, Serialization, Unsubscribed, WebSocketPeer,
//! };
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (client_io, server_io) = duplex(64 * 1024);
//!
//! let (server, client) = tokio::join!(
//!     WebSocketPeer::accept(server_io, PeerConfig::default()),
//!     WebSocketPeer::dial_stream(
//!         "ws://localhost/ws",
//!         client_io,
//!         Serialization::Json,
//!         PeerConfig::default(),
//!     ),
//! );
//! let (server, client) = (server.unwrap(), client.unwrap());
//!
//! client
//!     .send(Message::Unsubscribed(Unsubscribed { request: 7 }))
//!     .await
//!     .unwrap();
//! assert_eq!(
//!     server.receive().await,
//!     Some(Message::Unsubscribed(Unsubscribed { request: 7 }))
//! );
//!
//! client.close().await.unwrap();
//! assert_eq!(server.receive().await, None);
//! # });
//! ```

pub(crate) mod connection;
pub(crate) mod inbound_pump;
pub(crate) mod outbound_pump;
pub(crate) mod outbound_queue;
pub(crate) mod shutdown;
#[cfg(test)]
pub(crate) mod test_sinks;
pub(crate) mod websocket_peer;
