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

use crate::error::PeerError;
use crate::message::Message;
use async_trait::async_trait;
use std::sync::Arc;

///
/// [`Sender`] is the only delivery mechanism the broker uses to reach a participant.
///
/// Implementations either never block for long or document when they do; the broker
/// never inspects transport internals behind this call.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use tokio::sync::Mutex;
/// use wamp_broker::{Message, PeerError, Sender, SenderRef};
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
/// let inbox: SenderRef = Arc::new(Inbox::default());
/// ```
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), PeerError>;
}

/// One live connection to a remote participant.
#[async_trait]
pub trait Peer: Sender {
    /// Returns the next inbound message, or `None` once the connection has ended.
    async fn receive(&self) -> Option<Message>;

    /// Shuts the connection down. Calls after the first one are no-ops.
    async fn close(&self) -> Result<(), PeerError>;
}

/// Shared handle to a participant. Identity is the shared allocation, not its value.
pub type SenderRef = Arc<dyn Sender>;
