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

use crate::message::{Uri, ERR_NO_SUCH_SUBSCRIPTION};
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Per-request failures surfaced to the requester as an error response.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ProtocolError {
    #[error("no such subscription")]
    NoSuchSubscription,
}

impl ProtocolError {
    /// Protocol error URI carried in the error response.
    pub fn uri(&self) -> Uri {
        match self {
            ProtocolError::NoSuchSubscription => Uri::from(ERR_NO_SUCH_SUBSCRIPTION),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec failure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("msgpack encode failure: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),
    #[error("msgpack decode failure: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),
    #[error("text frame payload is not valid utf-8: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),
}

/// Connection-level failures. These stay local to the affected peer.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("websocket transport failure: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("remote agreed on unsupported subprotocol '{0}'")]
    UnsupportedSubprotocol(String),
    #[error("remote did not agree on a serialization subprotocol")]
    NoSubprotocol,
    #[error("timed out tearing down the connection")]
    TeardownTimeout,
}
