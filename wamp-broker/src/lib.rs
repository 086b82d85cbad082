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

//! # wamp-broker
//!
//! `wamp-broker` is the routing core of a WAMP publish/subscribe broker: it keeps
//! track of who is subscribed to which topic, decides which subscribers receive a
//! publication, and carries protocol messages over WebSocket connections.
//!
//! Typical usage is API-first and centered on [`DefaultBroker`] and
//! [`WebSocketPeer`]. Anything that implements [`Sender`] can take part in routing.
//!
//! ## Publish and subscribe
//!
//! Publishers can narrow delivery with options: a subscriber whose stored options
//! define the same key with a different value is skipped. A publisher never
//! receives its own events.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use tokio::sync::Mutex;
//! use wamp_broker::{
//!     Broker, DefaultBroker, Dict, Message, PeerError, Publish, Sender, SenderRef, Subscribe,
//!     Uri,
//! };
//!
//! # #[derive(Default)]
//! # struct Inbox {
//! #     messages: Mutex<Vec<Message>>,
//! # }
//! #
//! # #[async_trait]
//! # impl Sender for Inbox {
//! #     async fn send(&self, message: Message) -> Result<(), PeerError> {
//! #         self.messages.lock().await.push(message);
//! #         Ok(())
//! #     }
//! # }
//! #
//! # fn events(messages: &[Message]) -> usize {
//! #     messages.iter().filter(|m| matches!(m, Message::Event(_))).count()
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = DefaultBroker::new();
//! let (a, b, c) = (
//!     Arc::new(Inbox::default()),
//!     Arc::new(Inbox::default()),
//!     Arc::new(Inbox::default()),
//! );
//! let a_ref: SenderRef = a.clone();
//! let b_ref: SenderRef = b.clone();
//! let c_ref: SenderRef = c.clone();
//!
//! let mut tagged = Dict::new();
//! tagged.insert("x".to_string(), json!(1));
//!
//! broker
//!     .subscribe(&a_ref, Subscribe { request: 1, topic: Uri::from("t"), ..Default::default() })
//!     .await;
//! broker
//!     .subscribe(&b_ref, Subscribe { request: 1, topic: Uri::from("t"), options: tagged.clone() })
//!     .await;
//! broker
//!     .publish(
//!         &c_ref,
//!         Publish {
//!             request: 2,
//!             options: tagged,
//!             topic: Uri::from("t"),
//!             arguments: vec![json!(1), json!(2)],
//!             ..Default::default()
//!         },
//!     )
//!     .await;
//!
//! // `a` has no "x" option so it stays eligible; `c` published and gets nothing.
//! assert_eq!(events(&a.messages.lock().await), 1);
//! assert_eq!(events(&b.messages.lock().await), 1);
//! assert!(c.messages.lock().await.is_empty());
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`Broker`] / [`DefaultBroker`] publish, subscribe and unsubscribe
//! - Control plane: subscription indices and sender identity
//! - Routing: eligibility policy, route projection and delivery planning
//! - Data plane: WebSocket transport peer, outbound queue and pumps
//! - Runtime: pump task spawning and the per-peer session loop
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events with `event` and `component` fields and does not
//! initialize a global subscriber on its own. Binaries and tests install one at
//! process boundaries, typically through `observability::diagnostics`.

mod broker;
pub use broker::{Broker, DefaultBroker};

mod codec;
pub use codec::{
    JsonSerializer, MessagePackSerializer, PayloadType, Serialization, Serializer,
    JSON_SUBPROTOCOL, MSGPACK_SUBPROTOCOL,
};

mod control_plane;
pub use control_plane::peer_identity::is_same_sender;

mod data_plane;
pub use data_plane::outbound_queue::BackpressurePolicy;
pub use data_plane::websocket_peer::{backpressure_for, PeerConfig, WebSocketPeer};

mod error;
pub use error::{CodecError, PeerError, ProtocolError};

mod message;
pub use message::{
    new_id, Dict, ErrorMessage, Event, Id, List, Message, MessageType, Publish, Published,
    Subscribe, Subscribed, Unsubscribe, Unsubscribed, Uri, ERR_NO_SUCH_SUBSCRIPTION,
    OPTION_ACKNOWLEDGE,
};

#[doc(hidden)]
pub mod observability;
pub use observability::fields::PeerRole;

mod routing;
pub use routing::eligibility::{options_match, DefaultEligibilityPolicy, EligibilityPolicy};
pub use routing::route::Route;

mod runtime;
pub use runtime::session_runtime::serve_peer;

mod sender;
pub use sender::{Peer, Sender, SenderRef};
