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

//! Session loop feeding one peer's broker requests into a shared broker.

use crate::broker::Broker;
use crate::message::Message;
use crate::observability::events;
use crate::sender::{Peer, SenderRef};
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "session_runtime";

/// Serves `peer` until its receive sequence ends.
///
/// Subscribe, Unsubscribe and Publish go to `broker` with `peer` as the acting
/// participant. Every other message type is logged and ignored. The peer is not
/// closed on return.
pub async fn serve_peer<P>(broker: Arc<dyn Broker>, peer: Arc<P>)
where
    P: Peer + 'static,
{
    let sender: SenderRef = peer.clone();
    info!(
        event = events::SESSION_START,
        component = COMPONENT,
        "session started"
    );

    let mut handled: u64 = 0;
    while let Some(message) = peer.receive().await {
        handled += 1;
        match message {
            Message::Subscribe(msg) => {
                broker.subscribe(&sender, msg).await;
            }
            Message::Unsubscribe(msg) => {
                // The broker already replied with the error response.
                let _ = broker.unsubscribe(&sender, msg).await;
            }
            Message::Publish(msg) => {
                broker.publish(&sender, msg).await;
            }
            other => {
                debug!(
                    event = events::SESSION_UNSUPPORTED_MESSAGE,
                    component = COMPONENT,
                    msg_type = %other.message_type(),
                    "ignoring message not handled by the broker"
                );
            }
        }
    }

    info!(
        event = events::SESSION_END,
        component = COMPONENT,
        handled,
        "session ended"
    );
}
