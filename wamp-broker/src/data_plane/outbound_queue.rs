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

//! Bounded outbound queue with a per-connection backpressure policy.

use crate::data_plane::shutdown::ShutdownSignal;
use crate::message::Message;
use crate::observability::events;
use crate::observability::fields::{self, PeerContext};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

const COMPONENT: &str = "outbound_queue";

/// What a peer does when its outbound queue is full.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Wait for room in the queue or for shutdown, whichever comes first.
    Block,
    /// Discard the message and log it. The caller never waits.
    Drop,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum EnqueueOutcome {
    Queued,
    Dropped,
    Shutdown,
}

pub(crate) struct OutboundQueue {
    sender: mpsc::Sender<Message>,
    policy: BackpressurePolicy,
    shutdown: ShutdownSignal,
    context: PeerContext,
}

impl OutboundQueue {
    /// Creates the queue and the receiving half drained by the outbound pump.
    ///
    /// A capacity of zero is raised to one.
    pub(crate) fn channel(
        capacity: usize,
        policy: BackpressurePolicy,
        shutdown: ShutdownSignal,
        context: PeerContext,
    ) -> (Self, mpsc::Receiver<Message>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                policy,
                shutdown,
                context,
            },
            receiver,
        )
    }

    pub(crate) fn policy(&self) -> BackpressurePolicy {
        self.policy
    }

    pub(crate) async fn enqueue(&self, message: Message) -> EnqueueOutcome {
        if self.shutdown.is_fired() {
            return self.shutdown_outcome(&message, fields::REASON_SHUTDOWN);
        }

        match self.policy {
            BackpressurePolicy::Block => {
                let msg_type = message.message_type();
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait() => {
                        debug!(
                            event = events::OUTBOUND_QUEUE_SHUTDOWN,
                            component = COMPONENT,
                            peer_id = self.context.peer_id.as_str(),
                            role = %self.context.role,
                            msg_type = %msg_type,
                            reason = fields::REASON_SHUTDOWN,
                            "blocked send released by shutdown"
                        );
                        EnqueueOutcome::Shutdown
                    }
                    sent = self.sender.send(message) => match sent {
                        Ok(()) => EnqueueOutcome::Queued,
                        Err(mpsc::error::SendError(message)) => {
                            self.shutdown_outcome(&message, fields::REASON_QUEUE_CLOSED)
                        }
                    },
                }
            }
            BackpressurePolicy::Drop => match self.sender.try_send(message) {
                Ok(()) => EnqueueOutcome::Queued,
                Err(TrySendError::Full(message)) => {
                    warn!(
                        event = events::OUTBOUND_QUEUE_FULL_DROP,
                        component = COMPONENT,
                        peer_id = self.context.peer_id.as_str(),
                        role = %self.context.role,
                        msg_type = %message.message_type(),
                        "outbound queue is full; dropping message"
                    );
                    EnqueueOutcome::Dropped
                }
                Err(TrySendError::Closed(message)) => {
                    self.shutdown_outcome(&message, fields::REASON_QUEUE_CLOSED)
                }
            },
        }
    }

    fn shutdown_outcome(&self, message: &Message, reason: &str) -> EnqueueOutcome {
        debug!(
            event = events::OUTBOUND_QUEUE_SHUTDOWN,
            component = COMPONENT,
            peer_id = self.context.peer_id.as_str(),
            role = %self.context.role,
            msg_type = %message.message_type(),
            reason,
            "peer is shutting down; message not sent"
        );
        EnqueueOutcome::Shutdown
    }
}
