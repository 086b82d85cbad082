//! Frame sinks standing in for a WebSocket write half in unit tests.

use futures::channel::mpsc;
use futures::{Sink, SinkExt};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};

/// Sink that forwards every frame to the returned receiver.
pub(crate) fn recording_sink() -> (
    impl Sink<WsMessage, Error = WsError> + Unpin + Send + 'static,
    mpsc::UnboundedReceiver<WsMessage>,
) {
    let (sender, receiver) = mpsc::unbounded();
    let sink = sender.sink_map_err(|_| WsError::ConnectionClosed);
    (sink, receiver)
}

/// Sink whose every operation fails with an I/O error.
pub(crate) struct BrokenSink;

fn broken_pipe() -> WsError {
    WsError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
}

impl Sink<WsMessage> for BrokenSink {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, _item: WsMessage) -> Result<(), WsError> {
        Err(broken_pipe())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Err(broken_pipe()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Ready(Err(broken_pipe()))
    }
}

/// Sink that never makes progress.
pub(crate) struct StalledSink;

impl Sink<WsMessage> for StalledSink {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Pending
    }

    fn start_send(self: Pin<&mut Self>, _item: WsMessage) -> Result<(), WsError> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Pending
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), WsError>> {
        Poll::Pending
    }
}
