//! Routing and eligibility layer.
//!
//! Encapsulates the publisher-side option filter, the pluggable eligibility policy,
//! and the conversion of a subscription snapshot into concrete deliveries.
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use wamp_broker::{
//!     DefaultEligibilityPolicy, Dict, EligibilityPolicy, Message, PeerError, Publish, Route,
//!     Sender, SenderRef,
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
//! let publisher: SenderRef = Arc::new(Discard);
//! let mut admin_options = Dict::new();
//! admin_options.insert("role".to_string(), json!("admin"));
//! let mut guest_options = Dict::new();
//! guest_options.insert("role".to_string(), json!("guest"));
//!
//! let mut routes = HashMap::new();
//! routes.insert(1, Route::new(Arc::new(Discard), admin_options.clone()));
//! routes.insert(2, Route::new(Arc::new(Discard), guest_options));
//! routes.insert(3, Route::new(publisher.clone(), Dict::new()));
//!
//! let msg = Publish {
//!     options: admin_options,
//!     ..Default::default()
//! };
//!
//! let eligible = DefaultEligibilityPolicy.publish_routes(&publisher, routes, &msg);
//! assert_eq!(eligible.len(), 1);
//! assert!(eligible.contains_key(&1));
//! ```

pub(crate) mod delivery;
pub(crate) mod eligibility;
pub(crate) mod route;
