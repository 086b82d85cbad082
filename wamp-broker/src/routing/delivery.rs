//! Delivery planning for one publication.
//!
//! Plans are computed from an owned route snapshot so the index lock is never held
//! while a recipient's send contract runs.

use crate::control_plane::peer_identity::is_same_sender;
use crate::message::{Dict, Event, Id, Message, Publish};
use crate::observability::{events, fields};
use crate::routing::eligibility::EligibilityPolicy;
use crate::routing::route::Route;
use crate::sender::SenderRef;
use std::collections::HashMap;
use tracing::{debug, warn};

const COMPONENT: &str = "delivery";

/// One outbound message bound for one recipient.
pub(crate) struct Delivery {
    pub(crate) subscription: Option<Id>,
    pub(crate) recipient: SenderRef,
    pub(crate) message: Message,
}

impl Delivery {
    pub(crate) fn reply(recipient: SenderRef, message: Message) -> Self {
        Self {
            subscription: None,
            recipient,
            message,
        }
    }
}

/// Builds one event per eligible subscriber of a publication.
pub(crate) fn plan_publication(
    publication: Id,
    publisher: &SenderRef,
    routes: HashMap<Id, Route>,
    msg: &Publish,
    policy: &dyn EligibilityPolicy,
) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(routes.len());

    for (subscription, route) in routes {
        if is_same_sender(publisher, &route.sender) {
            continue;
        }

        if !policy.should_publish(publisher, &route.sender, &route.options, msg) {
            debug!(
                event = events::PUBLISH_SUBSCRIBER_FILTERED,
                component = COMPONENT,
                topic = msg.topic.as_str(),
                publication,
                subscription,
                "subscriber filtered by eligibility policy"
            );
            continue;
        }

        deliveries.push(Delivery {
            subscription: Some(subscription),
            recipient: route.sender,
            message: Message::Event(Event {
                subscription,
                publication,
                details: Dict::new(),
                arguments: msg.arguments.clone(),
                arguments_kw: msg.arguments_kw.clone(),
            }),
        });
    }

    deliveries
}

/// Attempts every delivery in order. Failures stay local to their recipient.
pub(crate) async fn dispatch(deliveries: Vec<Delivery>) {
    for delivery in deliveries {
        let msg_type = delivery.message.message_type();
        if let Err(err) = delivery.recipient.send(delivery.message).await {
            warn!(
                event = events::DELIVERY_SEND_FAILED,
                component = COMPONENT,
                msg_type = %msg_type,
                subscription = fields::format_optional_id(delivery.subscription).as_str(),
                err = %err,
                "unable to hand message to recipient"
            );
        }
    }
}
