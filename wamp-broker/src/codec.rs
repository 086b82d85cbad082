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

//! Message codecs and the serialization/frame-type pairing used by transport peers.

use crate::error::CodecError;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const JSON_SUBPROTOCOL: &str = "wamp.2.json";
pub const MSGPACK_SUBPROTOCOL: &str = "wamp.2.msgpack";

/// Converts protocol messages to and from one byte payload.
pub trait Serializer: Send + Sync {
    fn serialize(&self, message: &Message) -> Result<Vec<u8>, CodecError>;
    fn deserialize(&self, payload: &[u8]) -> Result<Message, CodecError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(message)?)
    }

    fn deserialize(&self, payload: &[u8]) -> Result<Message, CodecError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MessagePackSerializer;

impl Serializer for MessagePackSerializer {
    fn serialize(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec(message)?)
    }

    fn deserialize(&self, payload: &[u8]) -> Result<Message, CodecError> {
        Ok(rmp_serde::from_slice(payload)?)
    }
}

/// WebSocket frame kind a serializer's payloads travel in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PayloadType {
    Text,
    Binary,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Serialization {
    #[default]
    Json,
    MessagePack,
}

impl Serialization {
    pub const ALL: [Serialization; 2] = [Serialization::Json, Serialization::MessagePack];

    pub fn subprotocol(self) -> &'static str {
        match self {
            Serialization::Json => JSON_SUBPROTOCOL,
            Serialization::MessagePack => MSGPACK_SUBPROTOCOL,
        }
    }

    pub fn from_subprotocol(subprotocol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|serialization| serialization.subprotocol() == subprotocol.trim())
    }

    pub fn payload_type(self) -> PayloadType {
        match self {
            Serialization::Json => PayloadType::Text,
            Serialization::MessagePack => PayloadType::Binary,
        }
    }

    pub fn serializer(self) -> Arc<dyn Serializer> {
        match self {
            Serialization::Json => Arc::new(JsonSerializer),
            Serialization::MessagePack => Arc::new(MessagePackSerializer),
        }
    }
}

impl Display for Serialization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subprotocol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Dict, Event, Subscribe, Uri};
    use serde_json::json;

    fn sample_event() -> Message {
        let mut arguments_kw = Dict::new();
        arguments_kw.insert("unit".to_string(), json!("celsius"));
        Message::Event(Event {
            subscription: 41,
            publication: 42,
            details: Dict::new(),
            arguments: vec![json!(1), json!("two"), json!({"three": 3})],
            arguments_kw,
        })
    }

    #[test]
    fn json_payload_is_the_positional_array() {
        let message = Message::Subscribe(Subscribe {
            request: 1,
            options: Dict::new(),
            topic: Uri::from("com.example.a"),
        });

        let payload = JsonSerializer.serialize(&message).expect("should encode");

        assert_eq!(
            String::from_utf8(payload).expect("json is utf-8"),
            r#"[32,1,{},"com.example.a"]"#
        );
    }

    #[test]
    fn msgpack_carries_nested_arguments() {
        let message = sample_event();

        let payload = MessagePackSerializer
            .serialize(&message)
            .expect("should encode");
        let decoded = MessagePackSerializer
            .deserialize(&payload)
            .expect("should decode");

        assert_eq!(decoded, message);
    }

    #[test]
    fn json_rejects_garbage_payload() {
        assert!(JsonSerializer.deserialize(b"not a message").is_err());
    }

    #[test]
    fn serialization_pairs_subprotocol_with_frame_type() {
        assert_eq!(Serialization::Json.payload_type(), PayloadType::Text);
        assert_eq!(
            Serialization::MessagePack.payload_type(),
            PayloadType::Binary
        );
        assert_eq!(
            Serialization::from_subprotocol(" wamp.2.msgpack"),
            Some(Serialization::MessagePack)
        );
        assert_eq!(Serialization::from_subprotocol("wamp.2.cbor"), None);
    }
}
