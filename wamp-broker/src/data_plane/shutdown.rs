//! One-shot shutdown signal shared by a peer's pumps, its queue, and `close()`.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub(crate) struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Fires the signal. Returns `true` only for the call that actually fired it.
    pub(crate) fn fire(&self) -> bool {
        self.sender.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub(crate) fn is_fired(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal has fired, immediately if it already has.
    pub(crate) async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}
