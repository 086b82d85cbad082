//! Runtime helper for spawning per-connection pump tasks.

use crate::observability::events;
use crate::observability::fields::PeerContext;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

const COMPONENT: &str = "pump_runtime";

/// Spawns one pump on the current tokio runtime.
pub(crate) fn spawn_pump<F>(
    pump: &'static str,
    context: &PeerContext,
    pump_loop: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        peer_id = context.peer_id.as_str(),
        role = %context.role,
        pump,
        "spawning pump task"
    );

    let peer_id = context.peer_id.clone();
    tokio::spawn(async move {
        pump_loop.await;
        debug!(
            event = events::RUNTIME_TASK_EXIT,
            component = COMPONENT,
            peer_id = peer_id.as_str(),
            pump,
            "pump task finished"
        );
    })
}
