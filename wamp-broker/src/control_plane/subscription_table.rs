//! Subscription index storage owner.
//!
//! Keeps three indices in step: topic to subscriber routes, topic to subscriber
//! options, and subscription to topic. Callers serialize access; every method
//! leaves the three indices consistent on return.

use crate::error::ProtocolError;
use crate::message::{Dict, Id, Uri};
use crate::observability::{events, fields};
use crate::routing::route::Route;
use crate::sender::SenderRef;
use std::collections::HashMap;
use tracing::warn;

const COMPONENT: &str = "subscription_table";

#[derive(Default)]
pub(crate) struct SubscriptionTable {
    routes: HashMap<Uri, HashMap<Id, SenderRef>>,
    options: HashMap<Uri, HashMap<Id, Dict>>,
    subscriptions: HashMap<Id, Uri>,
}

impl SubscriptionTable {
    /// Creates an empty table.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers one subscription in all three indices.
    pub(crate) fn insert(
        &mut self,
        subscription: Id,
        topic: Uri,
        subscriber: SenderRef,
        options: Dict,
    ) {
        self.routes
            .entry(topic.clone())
            .or_default()
            .insert(subscription, subscriber);
        self.options
            .entry(topic.clone())
            .or_default()
            .insert(subscription, options);
        self.subscriptions.insert(subscription, topic);
    }

    /// Removes one subscription, pruning topics left without subscribers.
    ///
    /// Inconsistent routes/options entries are logged and skipped; the removal
    /// still succeeds once the reverse lookup entry is gone.
    pub(crate) fn remove(&mut self, subscription: Id) -> Result<Uri, ProtocolError> {
        let topic = self
            .subscriptions
            .remove(&subscription)
            .ok_or(ProtocolError::NoSuchSubscription)?;

        Self::remove_from_index(&mut self.routes, &topic, subscription, "routes");
        Self::remove_from_index(&mut self.options, &topic, subscription, "options");

        Ok(topic)
    }

    fn remove_from_index<V>(
        index: &mut HashMap<Uri, HashMap<Id, V>>,
        topic: &Uri,
        subscription: Id,
        index_name: &str,
    ) {
        let Some(entries) = index.get_mut(topic) else {
            warn!(
                event = events::SUBSCRIPTION_INDEX_INCONSISTENT,
                component = COMPONENT,
                index = index_name,
                topic = topic.as_str(),
                subscription,
                reason = fields::REASON_TOPIC_MISSING,
                "unable to find topic entry while unsubscribing"
            );
            return;
        };

        if entries.remove(&subscription).is_none() {
            warn!(
                event = events::SUBSCRIPTION_INDEX_INCONSISTENT,
                component = COMPONENT,
                index = index_name,
                topic = topic.as_str(),
                subscription,
                reason = fields::REASON_SUBSCRIPTION_MISSING,
                "subscription entry does not exist for topic"
            );
            return;
        }

        if entries.is_empty() {
            index.remove(topic);
        }
    }

    /// Projects the current subscribers of `topic` into owned routes.
    pub(crate) fn routes_for(&self, topic: &Uri) -> HashMap<Id, Route> {
        let Some(subscribers) = self.routes.get(topic) else {
            return HashMap::new();
        };
        let topic_options = self.options.get(topic);

        subscribers
            .iter()
            .map(|(subscription, subscriber)| {
                let options = topic_options
                    .and_then(|options| options.get(subscription))
                    .cloned()
                    .unwrap_or_default();
                (*subscription, Route::new(subscriber.clone(), options))
            })
            .collect()
    }

    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub(crate) fn topic_count(&self) -> usize {
        self.routes.len()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (subscription, topic) in &self.subscriptions {
            assert!(
                self.routes
                    .get(topic)
                    .is_some_and(|routes| routes.contains_key(subscription)),
                "subscription {subscription} missing from routes of {topic}"
            );
            assert!(
                self.options
                    .get(topic)
                    .is_some_and(|options| options.contains_key(subscription)),
                "subscription {subscription} missing from options of {topic}"
            );
        }

        for (topic, routes) in &self.routes {
            assert!(!routes.is_empty(), "empty routes entry for {topic}");
            for subscription in routes.keys() {
                assert_eq!(self.subscriptions.get(subscription), Some(topic));
            }
        }

        for (topic, options) in &self.options {
            assert!(!options.is_empty(), "empty options entry for {topic}");
            for subscription in options.keys() {
                assert_eq!(self.subscriptions.get(subscription), Some(topic));
            }
        }
    }
}
