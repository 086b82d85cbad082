use tokio::io::{duplex, DuplexStream};
use wamp_broker::{PeerConfig, PeerError, Serialization, WebSocketPeer};

pub const TEST_URL: &str = "ws://localhost/ws";

const DUPLEX_BUFFER: usize = 64 * 1024;

/// Connects an accepting peer and a dialing peer over an in-memory stream.
///
/// Returns `(acceptor, dialer)`.
pub async fn websocket_pair(
    serialization: Serialization,
    acceptor_config: PeerConfig,
    dialer_config: PeerConfig,
) -> Result<(WebSocketPeer<DuplexStream>, WebSocketPeer<DuplexStream>), PeerError> {
    let (dialer_io, acceptor_io) = duplex(DUPLEX_BUFFER);

    let (acceptor, dialer) = tokio::join!(
        WebSocketPeer::accept(acceptor_io, acceptor_config),
        WebSocketPeer::dial_stream(TEST_URL, dialer_io, serialization, dialer_config),
    );

    Ok((acceptor?, dialer?))
}
