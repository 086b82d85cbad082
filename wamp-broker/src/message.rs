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

//! Protocol message shapes consumed and produced by the broker core.
//!
//! Every message travels as a positional array headed by its [`MessageType`] code,
//! e.g. `[32, request, options, topic]` for a subscribe request. The same
//! representation is shared by every codec in [`crate::codec`].

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier for subscriptions, publications, and requests.
pub type Id = u64;

/// Keyword-style mapping used for options, details, and keyword arguments.
pub type Dict = serde_json::Map<String, Value>;

/// Ordered positional arguments.
pub type List = Vec<Value>;

/// Error URI reported when an unsubscribe names an unknown subscription.
pub const ERR_NO_SUCH_SUBSCRIPTION: &str = "wamp.error.no_such_subscription";

/// Option key a publisher sets to `true` to request a `Published` acknowledgement.
pub const OPTION_ACKNOWLEDGE: &str = "acknowledge";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a fresh identifier.
///
/// Identifiers come from one process-wide monotonic counter, so an identifier is
/// never handed out twice while the process is alive.
pub fn new_id() -> Id {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Opaque topic or error identifier. No structural validation is performed.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl From<String> for Uri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u64)]
pub enum MessageType {
    Error = 8,
    Publish = 16,
    Published = 17,
    Subscribe = 32,
    Subscribed = 33,
    Unsubscribe = 34,
    Unsubscribed = 35,
    Event = 36,
}

impl MessageType {
    pub fn code(self) -> u64 {
        self as u64
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            8 => Some(Self::Error),
            16 => Some(Self::Publish),
            17 => Some(Self::Published),
            32 => Some(Self::Subscribe),
            33 => Some(Self::Subscribed),
            34 => Some(Self::Unsubscribe),
            35 => Some(Self::Unsubscribed),
            36 => Some(Self::Event),
            _ => None,
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Error => "ERROR",
            Self::Publish => "PUBLISH",
            Self::Published => "PUBLISHED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Subscribed => "SUBSCRIBED",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Unsubscribed => "UNSUBSCRIBED",
            Self::Event => "EVENT",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subscribe {
    pub request: Id,
    pub options: Dict,
    pub topic: Uri,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subscribed {
    pub request: Id,
    pub subscription: Id,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unsubscribe {
    pub request: Id,
    pub subscription: Id,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unsubscribed {
    pub request: Id,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Publish {
    pub request: Id,
    pub options: Dict,
    pub topic: Uri,
    pub arguments: List,
    pub arguments_kw: Dict,
}

impl Publish {
    /// Returns `true` only when the publisher set `acknowledge` to boolean `true`.
    pub fn wants_acknowledge(&self) -> bool {
        matches!(self.options.get(OPTION_ACKNOWLEDGE), Some(Value::Bool(true)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Published {
    pub request: Id,
    pub publication: Id,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub subscription: Id,
    pub publication: Id,
    pub details: Dict,
    pub arguments: List,
    pub arguments_kw: Dict,
}

/// Error response echoing the request that failed.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorMessage {
    pub request_type: MessageType,
    pub request: Id,
    pub details: Dict,
    pub error: Uri,
    pub arguments: List,
    pub arguments_kw: Dict,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Error(ErrorMessage),
    Publish(Publish),
    Published(Published),
    Subscribe(Subscribe),
    Subscribed(Subscribed),
    Unsubscribe(Unsubscribe),
    Unsubscribed(Unsubscribed),
    Event(Event),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Error(_) => MessageType::Error,
            Message::Publish(_) => MessageType::Publish,
            Message::Published(_) => MessageType::Published,
            Message::Subscribe(_) => MessageType::Subscribe,
            Message::Subscribed(_) => MessageType::Subscribed,
            Message::Unsubscribe(_) => MessageType::Unsubscribe,
            Message::Unsubscribed(_) => MessageType::Unsubscribed,
            Message::Event(_) => MessageType::Event,
        }
    }
}

/// Number of trailing payload elements written after the fixed fields.
fn payload_len(arguments: &List, arguments_kw: &Dict) -> usize {
    if !arguments_kw.is_empty() {
        2
    } else if !arguments.is_empty() {
        1
    } else {
        0
    }
}

fn serialize_payload<S: SerializeSeq>(
    seq: &mut S,
    arguments: &List,
    arguments_kw: &Dict,
) -> Result<(), S::Error> {
    match payload_len(arguments, arguments_kw) {
        2 => {
            seq.serialize_element(arguments)?;
            seq.serialize_element(arguments_kw)
        }
        1 => seq.serialize_element(arguments),
        _ => Ok(()),
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let code = self.message_type().code();
        match self {
            Message::Error(msg) => {
                let len = 5 + payload_len(&msg.arguments, &msg.arguments_kw);
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request_type.code())?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.details)?;
                seq.serialize_element(&msg.error)?;
                serialize_payload(&mut seq, &msg.arguments, &msg.arguments_kw)?;
                seq.end()
            }
            Message::Publish(msg) => {
                let len = 4 + payload_len(&msg.arguments, &msg.arguments_kw);
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.options)?;
                seq.serialize_element(&msg.topic)?;
                serialize_payload(&mut seq, &msg.arguments, &msg.arguments_kw)?;
                seq.end()
            }
            Message::Published(msg) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.publication)?;
                seq.end()
            }
            Message::Subscribe(msg) => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.options)?;
                seq.serialize_element(&msg.topic)?;
                seq.end()
            }
            Message::Subscribed(msg) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.subscription)?;
                seq.end()
            }
            Message::Unsubscribe(msg) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.serialize_element(&msg.subscription)?;
                seq.end()
            }
            Message::Unsubscribed(msg) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.request)?;
                seq.end()
            }
            Message::Event(msg) => {
                let len = 4 + payload_len(&msg.arguments, &msg.arguments_kw);
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(&code)?;
                seq.serialize_element(&msg.subscription)?;
                seq.serialize_element(&msg.publication)?;
                seq.serialize_element(&msg.details)?;
                serialize_payload(&mut seq, &msg.arguments, &msg.arguments_kw)?;
                seq.end()
            }
        }
    }
}

fn required<'de, A, T>(seq: &mut A, index: usize) -> Result<T, A::Error>
where
    A: SeqAccess<'de>,
    T: Deserialize<'de>,
{
    seq.next_element()?
        .ok_or_else(|| de::Error::invalid_length(index, &"a complete protocol message"))
}

fn optional_payload<'de, A>(seq: &mut A) -> Result<(List, Dict), A::Error>
where
    A: SeqAccess<'de>,
{
    let arguments = seq.next_element::<List>()?.unwrap_or_default();
    let arguments_kw = seq.next_element::<Dict>()?.unwrap_or_default();
    Ok((arguments, arguments_kw))
}

struct MessageVisitor;

impl<'de> Visitor<'de> for MessageVisitor {
    type Value = Message;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a protocol message array headed by its type code")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Message, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let code: u64 = required(&mut seq, 0)?;
        let message_type = MessageType::from_code(code).ok_or_else(|| {
            de::Error::invalid_value(de::Unexpected::Unsigned(code), &"a supported message type")
        })?;

        let message = match message_type {
            MessageType::Error => {
                let request_code: u64 = required(&mut seq, 1)?;
                let request_type = MessageType::from_code(request_code).ok_or_else(|| {
                    de::Error::invalid_value(
                        de::Unexpected::Unsigned(request_code),
                        &"a supported request type",
                    )
                })?;
                let request = required(&mut seq, 2)?;
                let details = required(&mut seq, 3)?;
                let error = required(&mut seq, 4)?;
                let (arguments, arguments_kw) = optional_payload(&mut seq)?;
                Message::Error(ErrorMessage {
                    request_type,
                    request,
                    details,
                    error,
                    arguments,
                    arguments_kw,
                })
            }
            MessageType::Publish => {
                let request = required(&mut seq, 1)?;
                let options = required(&mut seq, 2)?;
                let topic = required(&mut seq, 3)?;
                let (arguments, arguments_kw) = optional_payload(&mut seq)?;
                Message::Publish(Publish {
                    request,
                    options,
                    topic,
                    arguments,
                    arguments_kw,
                })
            }
            MessageType::Published => Message::Published(Published {
                request: required(&mut seq, 1)?,
                publication: required(&mut seq, 2)?,
            }),
            MessageType::Subscribe => Message::Subscribe(Subscribe {
                request: required(&mut seq, 1)?,
                options: required(&mut seq, 2)?,
                topic: required(&mut seq, 3)?,
            }),
            MessageType::Subscribed => Message::Subscribed(Subscribed {
                request: required(&mut seq, 1)?,
                subscription: required(&mut seq, 2)?,
            }),
            MessageType::Unsubscribe => Message::Unsubscribe(Unsubscribe {
                request: required(&mut seq, 1)?,
                subscription: required(&mut seq, 2)?,
            }),
            MessageType::Unsubscribed => Message::Unsubscribed(Unsubscribed {
                request: required(&mut seq, 1)?,
            }),
            MessageType::Event => {
                let subscription = required(&mut seq, 1)?;
                let publication = required(&mut seq, 2)?;
                let details = required(&mut seq, 3)?;
                let (arguments, arguments_kw) = optional_payload(&mut seq)?;
                Message::Event(Event {
                    subscription,
                    publication,
                    details,
                    arguments,
                    arguments_kw,
                })
            }
        };

        Ok(message)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(MessageVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_id_is_strictly_increasing() {
        let first = new_id();
        let second = new_id();

        assert!(second > first);
        assert_ne!(first, 0);
    }

    #[test]
    fn publish_encodes_kwargs_behind_empty_positional_list() {
        let mut arguments_kw = Dict::new();
        arguments_kw.insert("color".to_string(), json!("red"));
        let message = Message::Publish(Publish {
            request: 7,
            options: Dict::new(),
            topic: Uri::from("com.example.topic"),
            arguments: Vec::new(),
            arguments_kw,
        });

        let encoded = serde_json::to_value(&message).expect("publish should encode");

        assert_eq!(
            encoded,
            json!([16, 7, {}, "com.example.topic", [], {"color": "red"}])
        );
    }

    #[test]
    fn event_without_payload_omits_trailing_elements() {
        let message = Message::Event(Event {
            subscription: 3,
            publication: 9,
            ..Default::default()
        });

        let encoded = serde_json::to_value(&message).expect("event should encode");

        assert_eq!(encoded, json!([36, 3, 9, {}]));
    }

    #[test]
    fn error_decodes_request_type_and_uri() {
        let decoded: Message =
            serde_json::from_value(json!([8, 34, 12, {}, ERR_NO_SUCH_SUBSCRIPTION]))
                .expect("error should decode");

        let Message::Error(error) = decoded else {
            panic!("expected an error message");
        };
        assert_eq!(error.request_type, MessageType::Unsubscribe);
        assert_eq!(error.request, 12);
        assert_eq!(error.error.as_str(), ERR_NO_SUCH_SUBSCRIPTION);
        assert!(error.arguments.is_empty());
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        let decoded = serde_json::from_value::<Message>(json!([99, 1]));

        assert!(decoded.is_err());
    }

    #[test]
    fn truncated_subscribe_is_rejected() {
        let decoded = serde_json::from_value::<Message>(json!([32, 1, {}]));

        assert!(decoded.is_err());
    }

    #[test]
    fn acknowledge_requires_boolean_true() {
        let mut publish = Publish::default();
        assert!(!publish.wants_acknowledge());

        publish
            .options
            .insert(OPTION_ACKNOWLEDGE.to_string(), json!("true"));
        assert!(!publish.wants_acknowledge());

        publish
            .options
            .insert(OPTION_ACKNOWLEDGE.to_string(), json!(false));
        assert!(!publish.wants_acknowledge());

        publish
            .options
            .insert(OPTION_ACKNOWLEDGE.to_string(), json!(true));
        assert!(publish.wants_acknowledge());
    }
}
