//! Outbound pump: drains the outbound queue in order, one frame per message.

use crate::codec::{PayloadType, Serializer};
use crate::data_plane::connection::Connection;
use crate::error::CodecError;
use crate::message::Message;
use crate::observability::events;
use futures::Sink;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::warn;

const COMPONENT: &str = "outbound_pump";

/// Encodes one message into the frame kind paired with the serializer.
pub(crate) fn encode_frame(
    serializer: &dyn Serializer,
    payload_type: PayloadType,
    message: &Message,
) -> Result<WsMessage, CodecError> {
    let payload = serializer.serialize(message)?;
    Ok(match payload_type {
        PayloadType::Text => WsMessage::Text(String::from_utf8(payload)?),
        PayloadType::Binary => WsMessage::Binary(payload),
    })
}

/// Runs until shutdown fires, the queue closes, or a write fails.
pub(crate) async fn run_outbound_pump<W>(
    mut outbound: mpsc::Receiver<Message>,
    connection: Arc<Connection<W>>,
    serializer: Arc<dyn Serializer>,
    payload_type: PayloadType,
) where
    W: Sink<WsMessage, Error = WsError> + Unpin + Send,
{
    let context = connection.context().clone();
    let shutdown = connection.shutdown().clone();

    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            next = outbound.recv() => match next {
                Some(message) => message,
                None => break,
            },
        };

        let frame = match encode_frame(serializer.as_ref(), payload_type, &message) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(
                    event = events::OUTBOUND_ENCODE_FAILED,
                    component = COMPONENT,
                    peer_id = context.peer_id.as_str(),
                    role = %context.role,
                    msg_type = %message.message_type(),
                    err = %err,
                    "unable to encode outbound message"
                );
                continue;
            }
        };

        let written = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            written = connection.write(frame) => written,
        };

        if let Err(err) = written {
            warn!(
                event = events::OUTBOUND_WRITE_FAILED,
                component = COMPONENT,
                peer_id = context.peer_id.as_str(),
                role = %context.role,
                msg_type = %message.message_type(),
                err = %err,
                "error writing to peer; closing connection"
            );
            let _ = connection.teardown().await;
            break;
        }
    }
}
