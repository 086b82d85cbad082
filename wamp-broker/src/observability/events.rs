//! Canonical structured event names used across `wamp-broker`.

// Broker lifecycle and request events.
pub const BROKER_CREATED: &str = "broker_created";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
pub const UNSUBSCRIBE_FAILED: &str = "unsubscribe_failed";
pub const PUBLISH_FANOUT: &str = "publish_fanout";
pub const PUBLISH_SUBSCRIBER_FILTERED: &str = "publish_subscriber_filtered";
pub const DELIVERY_SEND_FAILED: &str = "delivery_send_failed";
pub const SUBSCRIPTION_INDEX_INCONSISTENT: &str = "subscription_index_inconsistent";

// Transport peer events.
pub const PEER_OPEN: &str = "peer_open";
pub const PEER_HANDSHAKE_REJECTED: &str = "peer_handshake_rejected";
pub const PEER_CLOSE_REQUESTED: &str = "peer_close_requested";
pub const PEER_CLOSE_REPEATED: &str = "peer_close_repeated";
pub const PEER_CLOSE_FRAME_FAILED: &str = "peer_close_frame_failed";
pub const PEER_TEARDOWN_OK: &str = "peer_teardown_ok";
pub const PEER_TEARDOWN_FAILED: &str = "peer_teardown_failed";
pub const INBOUND_DECODE_FAILED: &str = "inbound_decode_failed";
pub const INBOUND_READ_FAILED: &str = "inbound_read_failed";
pub const INBOUND_REMOTE_CLOSED: &str = "inbound_remote_closed";
pub const INBOUND_RECEIVER_GONE: &str = "inbound_receiver_gone";
pub const INBOUND_UNEXPECTED_FRAME: &str = "inbound_unexpected_frame";
pub const OUTBOUND_ENCODE_FAILED: &str = "outbound_encode_failed";
pub const OUTBOUND_WRITE_FAILED: &str = "outbound_write_failed";
pub const OUTBOUND_QUEUE_FULL_DROP: &str = "outbound_queue_full_drop";
pub const OUTBOUND_QUEUE_SHUTDOWN: &str = "outbound_queue_shutdown";

// Runtime events.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_TASK_EXIT: &str = "runtime_task_exit";
pub const SESSION_START: &str = "session_start";
pub const SESSION_END: &str = "session_end";
pub const SESSION_UNSUPPORTED_MESSAGE: &str = "session_unsupported_message";

// Diagnostics toggle.
pub const DIAGNOSTICS_TOGGLED: &str = "diagnostics_toggled";
