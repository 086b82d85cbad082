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

mod support;

use integration_test_utils::{init_logging, FailingSender, RecordingSender};
use serde_json::json;
use std::collections::HashSet;
use support::{publish, sender_ref, subscribe, unsubscribe};
use wamp_broker::{Broker, DefaultBroker, Message, MessageType, ProtocolError};

#[tokio::test]
async fn publisher_subscribed_to_its_own_topic_gets_no_event() {
    init_logging();
    let broker = DefaultBroker::new();
    let publisher = RecordingSender::new();
    let other = RecordingSender::new();

    broker
        .subscribe(&sender_ref(&publisher), subscribe(1, "t", json!({})))
        .await;
    broker
        .subscribe(&sender_ref(&other), subscribe(1, "t", json!({})))
        .await;
    publisher.take().await;
    other.take().await;

    broker
        .publish(
            &sender_ref(&publisher),
            publish(2, "t", json!({}), vec![json!("hello")]),
        )
        .await;

    assert!(publisher.events().await.is_empty());
    assert_eq!(other.events().await.len(), 1);
}

#[tokio::test]
async fn publisher_options_select_matching_roles() {
    init_logging();
    let broker = DefaultBroker::new();
    let admin = RecordingSender::new();
    let guest = RecordingSender::new();
    let publisher = RecordingSender::new();

    broker
        .subscribe(&sender_ref(&admin), subscribe(1, "t", json!({"role": "admin"})))
        .await;
    broker
        .subscribe(&sender_ref(&guest), subscribe(1, "t", json!({"role": "guest"})))
        .await;

    broker
        .publish(
            &sender_ref(&publisher),
            publish(2, "t", json!({"role": "admin"}), vec![]),
        )
        .await;

    assert_eq!(admin.events().await.len(), 1);
    assert!(guest.events().await.is_empty());
}

#[tokio::test]
async fn subscriber_without_options_is_always_eligible() {
    init_logging();
    let broker = DefaultBroker::new();
    let plain = RecordingSender::new();
    let publisher = RecordingSender::new();

    broker
        .subscribe(&sender_ref(&plain), subscribe(1, "t", json!({})))
        .await;
    broker
        .publish(
            &sender_ref(&publisher),
            publish(2, "t", json!({"role": "admin", "region": "eu"}), vec![]),
        )
        .await;

    assert_eq!(plain.events().await.len(), 1);
}

#[tokio::test]
async fn unknown_unsubscribe_yields_one_error_and_no_mutation() {
    init_logging();
    let broker = DefaultBroker::new();
    let subscriber = RecordingSender::new();
    let subscription = broker
        .subscribe(&sender_ref(&subscriber), subscribe(1, "t", json!({})))
        .await;
    subscriber.take().await;

    let result = broker
        .unsubscribe(&sender_ref(&subscriber), unsubscribe(7, subscription + 1_000_000))
        .await;

    assert_eq!(result, Err(ProtocolError::NoSuchSubscription));
    let replies = subscriber.take().await;
    assert_eq!(replies.len(), 1);
    match &replies[0] {
        Message::Error(error) => {
            assert_eq!(error.request, 7);
            assert_eq!(error.request_type, MessageType::Unsubscribe);
            assert_eq!(error.error.as_str(), "wamp.error.no_such_subscription");
        }
        other => panic!("expected an error response, got {other:?}"),
    }
    assert_eq!(broker.subscription_count().await, 1);
    assert_eq!(broker.topic_count().await, 1);
}

#[tokio::test]
async fn subscription_ids_are_unique_while_active() {
    init_logging();
    let broker = DefaultBroker::new();
    let subscriber = RecordingSender::new();
    let mut active = HashSet::new();

    for request in 0..64u64 {
        let topic = format!("topic.{}", request % 4);
        let id = broker
            .subscribe(&sender_ref(&subscriber), subscribe(request, &topic, json!({})))
            .await;
        assert!(active.insert(id), "subscription id {id} was handed out twice");
    }

    let subscribed: HashSet<u64> = subscriber
        .take()
        .await
        .into_iter()
        .map(|message| match message {
            Message::Subscribed(subscribed) => subscribed.subscription,
            other => panic!("expected a subscribed reply, got {other:?}"),
        })
        .collect();
    assert_eq!(subscribed, active);
    assert_eq!(broker.topic_count().await, 4);
}

#[tokio::test]
async fn acknowledged_publish_confirms_after_all_events() {
    init_logging();
    let broker = DefaultBroker::new();
    let publisher = RecordingSender::new();
    let subscribers: Vec<_> = (0..3).map(|_| RecordingSender::new()).collect();
    for subscriber in &subscribers {
        broker
            .subscribe(&sender_ref(subscriber), subscribe(1, "t", json!({})))
            .await;
    }

    broker
        .publish(
            &sender_ref(&publisher),
            publish(9, "t", json!({"acknowledge": true}), vec![json!(1)]),
        )
        .await;

    // Publish returns only after the acknowledgement was handed over, so every
    // subscriber must already hold its event.
    let replies = publisher.take().await;
    assert_eq!(replies.len(), 1);
    let Message::Published(published) = &replies[0] else {
        panic!("expected a published reply");
    };
    assert_eq!(published.request, 9);
    for subscriber in &subscribers {
        let events = subscriber.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].publication, published.publication);
    }
}

#[tokio::test]
async fn publish_without_acknowledge_sends_no_confirmation() {
    init_logging();
    let broker = DefaultBroker::new();
    let publisher = RecordingSender::new();

    broker
        .publish(&sender_ref(&publisher), publish(1, "t", json!({}), vec![]))
        .await;
    broker
        .publish(
            &sender_ref(&publisher),
            publish(2, "t", json!({"acknowledge": false}), vec![]),
        )
        .await;
    broker
        .publish(
            &sender_ref(&publisher),
            publish(3, "t", json!({"acknowledge": "yes"}), vec![]),
        )
        .await;

    assert!(publisher.messages().await.is_empty());
}

#[tokio::test]
async fn end_to_end_option_filtering_scenario() {
    init_logging();
    let broker = DefaultBroker::new();
    let a = RecordingSender::new();
    let b = RecordingSender::new();
    let c = RecordingSender::new();

    broker
        .subscribe(&sender_ref(&a), subscribe(1, "t", json!({})))
        .await;
    broker
        .subscribe(&sender_ref(&b), subscribe(1, "t", json!({"x": 1})))
        .await;
    broker
        .publish(
            &sender_ref(&c),
            publish(2, "t", json!({"x": 1}), vec![json!(1), json!(2)]),
        )
        .await;

    let a_events = a.events().await;
    let b_events = b.events().await;
    assert_eq!(a_events.len(), 1);
    assert_eq!(b_events.len(), 1);
    assert_eq!(b_events[0].arguments, vec![json!(1), json!(2)]);
    assert!(c.messages().await.is_empty());
}

#[tokio::test]
async fn failing_subscriber_does_not_stop_fanout() {
    init_logging();
    let broker = DefaultBroker::new();
    let broken = FailingSender::new();
    let healthy = RecordingSender::new();
    let publisher = RecordingSender::new();

    broker
        .subscribe(&sender_ref(&broken), subscribe(1, "t", json!({})))
        .await;
    broker
        .subscribe(&sender_ref(&healthy), subscribe(1, "t", json!({})))
        .await;

    broker
        .publish(&sender_ref(&publisher), publish(2, "t", json!({}), vec![]))
        .await;

    // One failed Subscribed reply plus one failed Event.
    assert_eq!(broken.attempts(), 2);
    assert_eq!(healthy.events().await.len(), 1);
}

#[tokio::test]
async fn last_unsubscribe_prunes_the_topic() {
    init_logging();
    let broker = DefaultBroker::new();
    let subscriber = RecordingSender::new();
    let first = broker
        .subscribe(&sender_ref(&subscriber), subscribe(1, "t", json!({})))
        .await;
    let second = broker
        .subscribe(&sender_ref(&subscriber), subscribe(2, "t", json!({})))
        .await;

    broker
        .unsubscribe(&sender_ref(&subscriber), unsubscribe(3, first))
        .await
        .expect("first subscription should be removed");
    assert_eq!(broker.topic_count().await, 1);

    broker
        .unsubscribe(&sender_ref(&subscriber), unsubscribe(4, second))
        .await
        .expect("second subscription should be removed");
    assert_eq!(broker.topic_count().await, 0);
    assert_eq!(broker.subscription_count().await, 0);
}
