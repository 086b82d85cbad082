use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use wamp_broker::{Dict, Message, Peer, Publish, SenderRef, Subscribe, Unsubscribe, Uri};

pub(crate) const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn dict(value: Value) -> Dict {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a json object, got {other}"),
    }
}

pub(crate) fn sender_ref<S: wamp_broker::Sender + 'static>(sender: &Arc<S>) -> SenderRef {
    sender.clone()
}

pub(crate) fn subscribe(request: u64, topic: &str, options: Value) -> Subscribe {
    Subscribe {
        request,
        options: dict(options),
        topic: Uri::from(topic),
    }
}

#[allow(dead_code)]
pub(crate) fn unsubscribe(request: u64, subscription: u64) -> Unsubscribe {
    Unsubscribe {
        request,
        subscription,
    }
}

pub(crate) fn publish(request: u64, topic: &str, options: Value, arguments: Vec<Value>) -> Publish {
    Publish {
        request,
        options: dict(options),
        topic: Uri::from(topic),
        arguments,
        arguments_kw: Dict::new(),
    }
}

/// Receives the next message or panics once [`RECEIVE_TIMEOUT`] passes.
#[allow(dead_code)]
pub(crate) async fn next_message<P: Peer>(peer: &P) -> Option<Message> {
    tokio::time::timeout(RECEIVE_TIMEOUT, peer.receive())
        .await
        .expect("peer should produce a message or end its stream in time")
}
