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

//! Inbound pump: reads frames, decodes them, and feeds the peer's receive queue.

use crate::codec::Serializer;
use crate::data_plane::connection::Connection;
use crate::message::Message;
use crate::observability::events;
use futures::{Sink, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, info, warn};

const COMPONENT: &str = "inbound_pump";

/// Runs until the remote closes, a read fails, or shutdown fires.
///
/// Dropping `inbound` on exit ends the peer's receive sequence. Frames that fail
/// to decode are logged and skipped.
pub(crate) async fn run_inbound_pump<R, W>(
    mut reader: R,
    connection: Arc<Connection<W>>,
    serializer: Arc<dyn Serializer>,
    inbound: mpsc::Sender<Message>,
) where
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin + Send,
    W: Sink<WsMessage, Error = WsError> + Unpin + Send,
{
    let context = connection.context().clone();
    let shutdown = connection.shutdown().clone();

    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            frame = reader.next() => frame,
        };

        let payload = match frame {
            Some(Ok(WsMessage::Text(text))) => text.into_bytes(),
            Some(Ok(WsMessage::Binary(bytes))) => bytes,
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Close(_))) | None => {
                info!(
                    event = events::INBOUND_REMOTE_CLOSED,
                    component = COMPONENT,
                    peer_id = context.peer_id.as_str(),
                    role = %context.role,
                    "peer connection closed"
                );
                let _ = connection.teardown().await;
                break;
            }
            Some(Ok(other)) => {
                debug!(
                    event = events::INBOUND_UNEXPECTED_FRAME,
                    component = COMPONENT,
                    peer_id = context.peer_id.as_str(),
                    role = %context.role,
                    frame_len = other.len(),
                    "ignoring unexpected frame"
                );
                continue;
            }
            Some(Err(err)) => {
                warn!(
                    event = events::INBOUND_READ_FAILED,
                    component = COMPONENT,
                    peer_id = context.peer_id.as_str(),
                    role = %context.role,
                    err = %err,
                    "error reading from peer"
                );
                let _ = connection.teardown().await;
                break;
            }
        };

        let message = match serializer.deserialize(&payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    event = events::INBOUND_DECODE_FAILED,
                    component = COMPONENT,
                    peer_id = context.peer_id.as_str(),
                    role = %context.role,
                    payload_len = payload.len(),
                    err = %err,
                    "error deserializing peer message; frame dropped"
                );
                continue;
            }
        };

        let delivered = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            delivered = inbound.send(message) => delivered,
        };

        if delivered.is_err() {
            debug!(
                event = events::INBOUND_RECEIVER_GONE,
                component = COMPONENT,
                peer_id = context.peer_id.as_str(),
                role = %context.role,
                "receive queue dropped; stopping inbound pump"
            );
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run_inbound_pump;
    use crate::codec::{JsonSerializer, Serializer};
    use crate::data_plane::connection::Connection;
    use crate::data_plane::shutdown::ShutdownSignal;
    use crate::data_plane::test_sinks::recording_sink;
    use crate::message::{Message, Unsubscribed};
    use crate::observability::fields::{PeerContext, PeerRole};
    use futures::stream;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

    fn json_frame(message: &Message) -> WsMessage {
        let payload = JsonSerializer.serialize(message).expect("should encode");
        WsMessage::Text(String::from_utf8(payload).expect("json is utf-8"))
    }

    #[tokio::test]
    async fn garbage_frames_are_skipped_and_close_ends_the_stream() {
        let (writer, _frames) = recording_sink();
        let shutdown = ShutdownSignal::new();
        let connection = Arc::new(Connection::new(
            writer,
            shutdown.clone(),
            PeerContext::new(PeerRole::Acceptor),
            Duration::from_secs(1),
        ));
        let expected = Message::Unsubscribed(Unsubscribed { request: 5 });
        let reader = stream::iter(vec![
            Ok(WsMessage::Text("definitely not wamp".to_string())),
            Ok(WsMessage::Ping(vec![1])),
            Ok(json_frame(&expected)),
            Ok(WsMessage::Close(None)),
            Ok(json_frame(&expected)),
        ]);
        let (inbound, mut received) = mpsc::channel(4);

        run_inbound_pump(reader, connection, Arc::new(JsonSerializer), inbound).await;

        assert_eq!(received.recv().await, Some(expected));
        assert_eq!(received.recv().await, None);
        assert!(shutdown.is_fired());
    }

    #[tokio::test]
    async fn read_failure_tears_down_the_connection() {
        let (writer, _frames) = recording_sink();
        let shutdown = ShutdownSignal::new();
        let connection = Arc::new(Connection::new(
            writer,
            shutdown.clone(),
            PeerContext::new(PeerRole::Dialer),
            Duration::from_secs(1),
        ));
        let reader = stream::iter(vec![Err(WsError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )))]);
        let (inbound, mut received) = mpsc::channel(1);

        run_inbound_pump(reader, connection, Arc::new(JsonSerializer), inbound).await;

        assert_eq!(received.recv().await, None);
        assert!(shutdown.is_fired());
    }

    #[tokio::test]
    async fn shutdown_stops_a_pump_waiting_on_reads() {
        let (writer, _frames) = recording_sink();
        let shutdown = ShutdownSignal::new();
        let connection = Arc::new(Connection::new(
            writer,
            shutdown.clone(),
            PeerContext::new(PeerRole::Acceptor),
            Duration::from_secs(1),
        ));
        let reader = stream::pending::<Result<WsMessage, WsError>>();
        let (inbound, mut received) = mpsc::channel(1);

        let pump = tokio::spawn(run_inbound_pump(
            reader,
            connection,
            Arc::new(JsonSerializer),
            inbound,
        ));
        shutdown.fire();

        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump should stop on shutdown")
            .expect("pump task should not panic");
        assert_eq!(received.recv().await, None);
    }
}
