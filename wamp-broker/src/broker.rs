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

use crate::control_plane::subscription_table::SubscriptionTable;
use crate::error::ProtocolError;
use crate::message::{
    new_id, Dict, ErrorMessage, Id, Message, MessageType, Publish, Published, Subscribe,
    Subscribed, Unsubscribe, Unsubscribed,
};
use crate::observability::events;
use crate::routing::delivery::{dispatch, plan_publication, Delivery};
use crate::routing::eligibility::{DefaultEligibilityPolicy, EligibilityPolicy};
use crate::sender::SenderRef;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const COMPONENT: &str = "broker";

/// Routes events from publishers to subscribers.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Delivers a publication to every eligible subscriber except the publisher.
    ///
    /// When `acknowledge` is `true` in the publish options, the publisher receives a
    /// `Published` reply once every delivery has been attempted.
    async fn publish(&self, publisher: &SenderRef, msg: Publish);

    /// Registers `subscriber` on the topic and replies with `Subscribed`.
    async fn subscribe(&self, subscriber: &SenderRef, msg: Subscribe) -> Id;

    /// Removes a subscription and replies with `Unsubscribed`, or with an error
    /// response when the subscription is unknown.
    async fn unsubscribe(
        &self,
        subscriber: &SenderRef,
        msg: Unsubscribe,
    ) -> Result<(), ProtocolError>;
}

///
/// [`DefaultBroker`] matches topics exactly and filters subscribers through an
/// [`EligibilityPolicy`].
///
/// Publications read a shared snapshot of the subscription indices; subscribe and
/// unsubscribe take exclusive access. Every reply and event is sent after the lock
/// has been released, so a slow recipient never stalls the indices.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use serde_json::json;
/// use tokio::sync::Mutex;
/// use wamp_broker::{Broker, DefaultBroker, Message, PeerError, Publish, Sender, SenderRef, Subscribe, Uri};
///
/// #[derive(Default)]
/// struct Inbox {
///     messages: Mutex<Vec<Message>>,
/// }
///
/// #[async_trait]
/// impl Sender for Inbox {
///     async fn send(&self, message: Message) -> Result<(), PeerError> {
///         self.messages.lock().await.push(message);
///         Ok(())
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let broker = DefaultBroker::new();
/// let subscriber = Arc::new(Inbox::default());
/// let publisher = Arc::new(Inbox::default());
/// let subscriber_ref: SenderRef = subscriber.clone();
/// let publisher_ref: SenderRef = publisher.clone();
///
/// broker
///     .subscribe(
///         &subscriber_ref,
///         Subscribe {
///             request: 1,
///             topic: Uri::from("com.example.weather"),
///             ..Default::default()
///         },
///     )
///     .await;
///
/// broker
///     .publish(
///         &publisher_ref,
///         Publish {
///             request: 2,
///             topic: Uri::from("com.example.weather"),
///             arguments: vec![json!("sunny")],
///             ..Default::default()
///         },
///     )
///     .await;
///
/// let received = subscriber.messages.lock().await;
/// assert_eq!(received.len(), 2); // Subscribed, then the Event
/// assert!(publisher.messages.lock().await.is_empty());
/// # });
/// ```
pub struct DefaultBroker {
    subscriptions: RwLock<SubscriptionTable>,
    policy: Arc<dyn EligibilityPolicy>,
}

impl Default for DefaultBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultBroker {
    /// Creates a broker using [`DefaultEligibilityPolicy`].
    pub fn new() -> Self {
        Self::with_policy(Arc::new(DefaultEligibilityPolicy))
    }

    /// Creates a broker that consults `policy` for every subscriber of a publication.
    pub fn with_policy(policy: Arc<dyn EligibilityPolicy>) -> Self {
        debug!(
            event = events::BROKER_CREATED,
            component = COMPONENT,
            "broker created"
        );
        Self {
            subscriptions: RwLock::new(SubscriptionTable::new()),
            policy,
        }
    }

    /// Number of active subscriptions across all topics.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.subscription_count()
    }

    /// Number of topics with at least one active subscription.
    pub async fn topic_count(&self) -> usize {
        self.subscriptions.read().await.topic_count()
    }
}

#[async_trait]
impl Broker for DefaultBroker {
    async fn publish(&self, publisher: &SenderRef, msg: Publish) {
        let publication = new_id();

        let routes = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions.routes_for(&msg.topic)
        };

        let mut deliveries =
            plan_publication(publication, publisher, routes, &msg, self.policy.as_ref());

        debug!(
            event = events::PUBLISH_FANOUT,
            component = COMPONENT,
            topic = msg.topic.as_str(),
            publication,
            recipients = deliveries.len(),
            "publishing event"
        );

        // The acknowledgement goes last so it follows every event attempt.
        if msg.wants_acknowledge() {
            deliveries.push(Delivery::reply(
                publisher.clone(),
                Message::Published(Published {
                    request: msg.request,
                    publication,
                }),
            ));
        }

        dispatch(deliveries).await;
    }

    async fn subscribe(&self, subscriber: &SenderRef, msg: Subscribe) -> Id {
        let subscription = new_id();
        let Subscribe {
            request,
            options,
            topic,
        } = msg;

        {
            let mut subscriptions = self.subscriptions.write().await;
            subscriptions.insert(subscription, topic.clone(), subscriber.clone(), options);
        }

        info!(
            event = events::SUBSCRIBE_OK,
            component = COMPONENT,
            topic = topic.as_str(),
            subscription,
            request,
            "subscription registered"
        );

        dispatch(vec![Delivery::reply(
            subscriber.clone(),
            Message::Subscribed(Subscribed {
                request,
                subscription,
            }),
        )])
        .await;

        subscription
    }

    async fn unsubscribe(
        &self,
        subscriber: &SenderRef,
        msg: Unsubscribe,
    ) -> Result<(), ProtocolError> {
        let removed = {
            let mut subscriptions = self.subscriptions.write().await;
            subscriptions.remove(msg.subscription)
        };

        match removed {
            Ok(topic) => {
                info!(
                    event = events::UNSUBSCRIBE_OK,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    subscription = msg.subscription,
                    request = msg.request,
                    "subscription removed"
                );
                dispatch(vec![Delivery::reply(
                    subscriber.clone(),
                    Message::Unsubscribed(Unsubscribed {
                        request: msg.request,
                    }),
                )])
                .await;
                Ok(())
            }
            Err(err) => {
                warn!(
                    event = events::UNSUBSCRIBE_FAILED,
                    component = COMPONENT,
                    subscription = msg.subscription,
                    request = msg.request,
                    err = %err,
                    "error unsubscribing"
                );
                dispatch(vec![Delivery::reply(
                    subscriber.clone(),
                    Message::Error(ErrorMessage {
                        request_type: MessageType::Unsubscribe,
                        request: msg.request,
                        details: Dict::new(),
                        error: err.uri(),
                        arguments: Vec::new(),
                        arguments_kw: Dict::new(),
                    }),
                )])
                .await;
                Err(err)
            }
        }
    }
}
