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

//! Shared write half of one WebSocket connection.
//!
//! The outbound pump and `close()` both write through [`Connection`]; the mutex
//! keeps exactly one writer on the transport at a time.

use crate::data_plane::shutdown::ShutdownSignal;
use crate::error::PeerError;
use crate::observability::events;
use crate::observability::fields::PeerContext;
use futures::{Sink, SinkExt};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::error::ProtocolError as WsProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};

const COMPONENT: &str = "connection";
const CLOSE_REASON: &str = "goodbye";

/// Returns `true` for transport errors that only mean the connection is already gone.
pub(crate) fn is_closed_error(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(WsProtocolError::SendAfterClosing)
    )
}

pub(crate) struct Connection<W> {
    writer: Mutex<W>,
    shutdown: ShutdownSignal,
    context: PeerContext,
    close_timeout: Duration,
}

impl<W> Connection<W>
where
    W: Sink<WsMessage, Error = WsError> + Unpin + Send,
{
    pub(crate) fn new(
        writer: W,
        shutdown: ShutdownSignal,
        context: PeerContext,
        close_timeout: Duration,
    ) -> Self {
        Self {
            writer: Mutex::new(writer),
            shutdown,
            context,
            close_timeout,
        }
    }

    pub(crate) fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub(crate) fn context(&self) -> &PeerContext {
        &self.context
    }

    /// Writes and flushes exactly one frame.
    pub(crate) async fn write(&self, frame: WsMessage) -> Result<(), WsError> {
        let mut writer = self.writer.lock().await;
        writer.send(frame).await
    }

    /// Best-effort normal-closure frame, bounded by the close deadline.
    pub(crate) async fn write_close_frame(&self) {
        let frame = WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: CLOSE_REASON.into(),
        }));

        match timeout(self.close_timeout, self.write(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) if is_closed_error(&err) => {
                debug!(
                    event = events::PEER_CLOSE_FRAME_FAILED,
                    component = COMPONENT,
                    peer_id = self.context.peer_id.as_str(),
                    role = %self.context.role,
                    err = %err,
                    "connection already closed; close frame skipped"
                );
            }
            Ok(Err(err)) => {
                warn!(
                    event = events::PEER_CLOSE_FRAME_FAILED,
                    component = COMPONENT,
                    peer_id = self.context.peer_id.as_str(),
                    role = %self.context.role,
                    err = %err,
                    "error sending close frame"
                );
            }
            Err(_) => {
                warn!(
                    event = events::PEER_CLOSE_FRAME_FAILED,
                    component = COMPONENT,
                    peer_id = self.context.peer_id.as_str(),
                    role = %self.context.role,
                    timeout_ms = self.close_timeout.as_millis() as u64,
                    "timed out sending close frame"
                );
            }
        }
    }

    /// Fires shutdown and closes the write half.
    ///
    /// Transport conditions meaning "already closed" count as success.
    pub(crate) async fn teardown(&self) -> Result<(), PeerError> {
        self.shutdown.fire();

        let closed = timeout(self.close_timeout, async {
            let mut writer = self.writer.lock().await;
            writer.close().await
        })
        .await;

        let result = match closed {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) if is_closed_error(&err) => Ok(()),
            Ok(Err(err)) => Err(PeerError::Transport(err)),
            Err(_) => Err(PeerError::TeardownTimeout),
        };

        match &result {
            Ok(()) => info!(
                event = events::PEER_TEARDOWN_OK,
                component = COMPONENT,
                peer_id = self.context.peer_id.as_str(),
                role = %self.context.role,
                "connection torn down"
            ),
            Err(err) => warn!(
                event = events::PEER_TEARDOWN_FAILED,
                component = COMPONENT,
                peer_id = self.context.peer_id.as_str(),
                role = %self.context.role,
                err = %err,
                "connection teardown failed"
            ),
        }

        result
    }
}
