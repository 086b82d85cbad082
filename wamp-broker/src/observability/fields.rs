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

//! Canonical structured field keys and value-format helpers.

use crate::message::Id;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const PEER_ID: &str = "peer_id";
pub const ROLE: &str = "role";

pub const MSG_TYPE: &str = "msg_type";
pub const TOPIC: &str = "topic";
pub const SUBSCRIPTION: &str = "subscription";
pub const PUBLICATION: &str = "publication";
pub const REQUEST: &str = "request";

pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_TOPIC_MISSING: &str = "topic_missing";
pub const REASON_SUBSCRIPTION_MISSING: &str = "subscription_missing";
pub const REASON_SHUTDOWN: &str = "shutdown";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";

/// Which side of the handshake a transport peer played.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PeerRole {
    Dialer,
    Acceptor,
}

impl PeerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            PeerRole::Dialer => "dialer",
            PeerRole::Acceptor => "acceptor",
        }
    }
}

impl Display for PeerRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation fields attached to every event a transport peer emits.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerContext {
    pub peer_id: String,
    pub role: PeerRole,
}

impl PeerContext {
    pub fn new(role: PeerRole) -> Self {
        Self {
            peer_id: Uuid::new_v4().hyphenated().to_string(),
            role,
        }
    }
}

pub fn format_optional_id(id: Option<Id>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| NONE.to_string())
}
