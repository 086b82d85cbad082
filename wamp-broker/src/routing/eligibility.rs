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

//! Publication eligibility policy.
//!
//! The predicate form is the primitive; the bulk form filters a route mapping with
//! it. Both forms are part of the stable extension surface.

use crate::control_plane::peer_identity::is_same_sender;
use crate::message::{Dict, Id, Publish};
use crate::routing::route::Route;
use crate::sender::SenderRef;
use std::collections::HashMap;

/// Decides whether one subscriber receives one publication.
///
/// Custom policies may add criteria but must keep excluding the publisher. The broker
/// also drops self-deliveries before consulting the policy.
///
/// # Examples
///
/// ```
/// use wamp_broker::{
///     options_match, Dict, EligibilityPolicy, Publish, SenderRef, is_same_sender,
/// };
///
/// /// Delivers only publications carrying at least one positional argument.
/// struct NonEmptyOnly;
///
/// impl EligibilityPolicy for NonEmptyOnly {
///     fn should_publish(
///         &self,
///         publisher: &SenderRef,
///         subscriber: &SenderRef,
///         subscriber_options: &Dict,
///         msg: &Publish,
///     ) -> bool {
///         !is_same_sender(publisher, subscriber)
///             && options_match(&msg.options, subscriber_options)
///             && !msg.arguments.is_empty()
///     }
/// }
/// ```
pub trait EligibilityPolicy: Send + Sync {
    /// Predicate form.
    fn should_publish(
        &self,
        publisher: &SenderRef,
        subscriber: &SenderRef,
        subscriber_options: &Dict,
        msg: &Publish,
    ) -> bool;

    /// Bulk form: keeps only the routes the predicate accepts.
    fn publish_routes(
        &self,
        publisher: &SenderRef,
        routes: HashMap<Id, Route>,
        msg: &Publish,
    ) -> HashMap<Id, Route> {
        routes
            .into_iter()
            .filter(|(_, route)| self.should_publish(publisher, &route.sender, &route.options, msg))
            .collect()
    }
}

/// Publisher-side option filter.
///
/// A subscriber is excluded only when it stored a key the publisher also set, with a
/// different value. Missing keys always pass.
pub fn options_match(publisher_options: &Dict, subscriber_options: &Dict) -> bool {
    publisher_options.iter().all(|(option, publisher_value)| {
        subscriber_options
            .get(option)
            .map_or(true, |subscriber_value| subscriber_value == publisher_value)
    })
}

/// Self-exclusion followed by [`options_match`], and nothing more.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEligibilityPolicy;

impl DefaultEligibilityPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl EligibilityPolicy for DefaultEligibilityPolicy {
    fn should_publish(
        &self,
        publisher: &SenderRef,
        subscriber: &SenderRef,
        subscriber_options: &Dict,
        msg: &Publish,
    ) -> bool {
        if is_same_sender(publisher, subscriber) {
            return false;
        }

        options_match(&msg.options, subscriber_options)
    }
}

#[cfg(test)]
mod tests {
    use super::{options_match, DefaultEligibilityPolicy, EligibilityPolicy};
    use crate::error::PeerError;
    use crate::message::{Dict, Message, Publish};
    use crate::routing::route::Route;
    use crate::sender::{Sender, SenderRef};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct NoopSender;

    #[async_trait]
    impl Sender for NoopSender {
        async fn send(&self, _message: Message) -> Result<(), PeerError> {
            Ok(())
        }
    }

    fn dict(entries: &[(&str, Value)]) -> Dict {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn publish_with(options: Dict) -> Publish {
        Publish {
            options,
            ..Default::default()
        }
    }

    #[test]
    fn missing_subscriber_key_always_passes() {
        assert!(options_match(&dict(&[("role", json!("admin"))]), &Dict::new()));
        assert!(options_match(
            &dict(&[("role", json!("admin"))]),
            &dict(&[("region", json!("eu"))])
        ));
    }

    #[test]
    fn differing_value_for_shared_key_excludes() {
        assert!(options_match(
            &dict(&[("role", json!("admin"))]),
            &dict(&[("role", json!("admin"))])
        ));
        assert!(!options_match(
            &dict(&[("role", json!("admin"))]),
            &dict(&[("role", json!("guest"))])
        ));
    }

    #[test]
    fn subscriber_only_keys_never_exclude() {
        assert!(options_match(&Dict::new(), &dict(&[("role", json!("guest"))])));
    }

    #[test]
    fn default_policy_excludes_publisher() {
        let policy = DefaultEligibilityPolicy::new();
        let publisher: SenderRef = Arc::new(NoopSender);
        let subscriber: SenderRef = Arc::new(NoopSender);
        let msg = publish_with(Dict::new());

        assert!(!policy.should_publish(&publisher, &publisher.clone(), &Dict::new(), &msg));
        assert!(policy.should_publish(&publisher, &subscriber, &Dict::new(), &msg));
    }

    #[test]
    fn bulk_form_matches_predicate_form() {
        let policy = DefaultEligibilityPolicy::new();
        let publisher: SenderRef = Arc::new(NoopSender);
        let admin: SenderRef = Arc::new(NoopSender);
        let guest: SenderRef = Arc::new(NoopSender);
        let open: SenderRef = Arc::new(NoopSender);
        let msg = publish_with(dict(&[("role", json!("admin"))]));

        let mut routes = HashMap::new();
        routes.insert(1, Route::new(publisher.clone(), Dict::new()));
        routes.insert(2, Route::new(admin, dict(&[("role", json!("admin"))])));
        routes.insert(3, Route::new(guest, dict(&[("role", json!("guest"))])));
        routes.insert(4, Route::new(open, Dict::new()));

        let expected: Vec<u64> = {
            let mut ids: Vec<u64> = routes
                .iter()
                .filter(|(_, route)| {
                    policy.should_publish(&publisher, &route.sender, &route.options, &msg)
                })
                .map(|(id, _)| *id)
                .collect();
            ids.sort_unstable();
            ids
        };

        let mut eligible: Vec<u64> = policy
            .publish_routes(&publisher, routes, &msg)
            .into_keys()
            .collect();
        eligible.sort_unstable();

        assert_eq!(eligible, vec![2, 4]);
        assert_eq!(eligible, expected);
    }
}
