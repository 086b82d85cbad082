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

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use wamp_broker::{Event, Message, PeerError, Sender};

/// Sender that keeps every message it is handed, in arrival order.
#[derive(Default)]
pub struct RecordingSender {
    messages: Mutex<Vec<Message>>,
    arrived: Notify,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    /// Returns and forgets everything recorded so far.
    pub async fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock().await)
    }

    pub async fn events(&self) -> Vec<Event> {
        self.messages
            .lock()
            .await
            .iter()
            .filter_map(|message| match message {
                Message::Event(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Waits until at least `count` messages are recorded or `deadline` passes.
    pub async fn wait_for(&self, count: usize, deadline: Duration) -> Vec<Message> {
        let _ = tokio::time::timeout(deadline, async {
            loop {
                let arrived = self.arrived.notified();
                if self.messages.lock().await.len() >= count {
                    return;
                }
                arrived.await;
            }
        })
        .await;
        self.messages().await
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn send(&self, message: Message) -> Result<(), PeerError> {
        self.messages.lock().await.push(message);
        self.arrived.notify_waiters();
        Ok(())
    }
}

/// Sender whose every send fails, counting the attempts.
#[derive(Default)]
pub struct FailingSender {
    attempts: AtomicUsize,
}

impl FailingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Sender for FailingSender {
    async fn send(&self, _message: Message) -> Result<(), PeerError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(PeerError::TeardownTimeout)
    }
}
