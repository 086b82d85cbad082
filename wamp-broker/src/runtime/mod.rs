//! Runtime integration layer.
//!
//! Isolates task spawning for the transport pumps and the session loop that feeds
//! a peer's inbound requests into the broker, so async task boundaries stay in one
//! place.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use wamp_broker::{serve_peer, Broker, DefaultBroker, PeerConfig, WebSocketPeer};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker: Arc<dyn Broker> = Arc::new(DefaultBroker::new());
//! let listener = TcpListener::bind("127.0.0.1:8000").await.unwrap();
//!
//! loop {
//!     let (stream, _) = listener.accept().await.unwrap();
//!     let broker = broker.clone();
//!     tokio::spawn(async move {
//!         if let Ok(peer) = WebSocketPeer::accept(stream, PeerConfig::default()).await {
//!             serve_peer(broker, Arc::new(peer)).await;
//!         }
//!     });
//! }
//! # });
//! ```

pub(crate) mod pump_runtime;
pub(crate) mod session_runtime;
