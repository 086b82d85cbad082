//! Control-plane layer.
//!
//! Owns the subscription indices and the sender identity model. This layer is
//! responsible for keeping topic routes, topic options, and the reverse lookup in
//! step, and for pruning topics once their last subscriber leaves.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use wamp_broker::{
//!     Broker, DefaultBroker, Dict, Message, PeerError, Sender, SenderRef, Subscribe,
//!     Unsubscribe, Uri,
//! };
//!
//! # struct Discard;
//! #
//! # #[async_trait]
//! # impl Sender for Discard {
//! #     async fn send(&self, _message: Message) -> Result<(), PeerError> {
//! #         Ok(())
//! #     }
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = DefaultBroker::new();
//! let subscriber: SenderRef = Arc::new(Discard);
//!
//! let subscription = broker
//!     .subscribe(
//!         &subscriber,
//!         Subscribe {
//!             request: 1,
//!             options: Dict::new(),
//!             topic: Uri::from("com.example.topic"),
//!         },
//!     )
//!     .await;
//! assert_eq!(broker.topic_count().await, 1);
//!
//! broker
//!     .unsubscribe(&subscriber, Unsubscribe { request: 2, subscription })
//!     .await
//!     .unwrap();
//! // The topic is pruned with its last subscription.
//! assert_eq!(broker.topic_count().await, 0);
//! # });
//! ```

pub(crate) mod peer_identity;
pub(crate) mod subscription_table;
