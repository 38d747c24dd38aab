//! # Keyed Actor
//!
//! The "server" half: one Tokio task per key that drains its mailbox sequentially.
//!
//! ## Lifecycle
//!
//! 1. Spawned lazily by the [`ActorRegistry`](super::ActorRegistry) on the first
//!    request for its key.
//! 2. Acquires the key's lease, so a freshly spawned actor waits for a predecessor
//!    that is still draining.
//! 3. Processes requests one at a time.
//! 4. Exits when every sender is dropped (shutdown) or after `idle_timeout` without a
//!    request (eviction). On eviction it closes the mailbox first and then drains
//!    whatever was already queued, so no accepted request is lost.

use super::{ActionRequest, ActorEntity};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Exclusive right to act for one key. Outlives individual actors.
pub(crate) type Lease = Arc<Mutex<()>>;

pub struct KeyedActor<T: ActorEntity> {
    id: T::Id,
    receiver: mpsc::Receiver<ActionRequest<T>>,
    context: Arc<T::Context>,
    lease: Lease,
    idle_timeout: Duration,
}

impl<T: ActorEntity> KeyedActor<T> {
    pub(crate) fn new(
        id: T::Id,
        receiver: mpsc::Receiver<ActionRequest<T>>,
        context: Arc<T::Context>,
        lease: Lease,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            id,
            receiver,
            context,
            lease,
            idle_timeout,
        }
    }

    /// Runs the mailbox loop until shutdown or idle eviction.
    pub async fn run(mut self) {
        // Extract just the type name (e.g., "StockLedger" instead of the full path)
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let _lease = self.lease.clone().lock_owned().await;
        debug!(entity_type, id = %self.id, "Actor started");

        loop {
            match tokio::time::timeout(self.idle_timeout, self.receiver.recv()).await {
                Ok(Some(request)) => self.process(entity_type, request).await,
                Ok(None) => break,
                Err(_) => {
                    self.receiver.close();
                    let mut drained = 0usize;
                    while let Some(request) = self.receiver.recv().await {
                        drained += 1;
                        self.process(entity_type, request).await;
                    }
                    debug!(entity_type, id = %self.id, drained, "Idle, evicted");
                    break;
                }
            }
        }

        debug!(entity_type, id = %self.id, "Shutdown");
    }

    async fn process(&self, entity_type: &str, request: ActionRequest<T>) {
        debug!(entity_type, id = %self.id, action = ?request.action, "Action");
        let result = T::handle_action(&self.id, request.action, &self.context).await;
        if let Err(e) = &result {
            debug!(entity_type, id = %self.id, error = %e, "Action failed");
        }
        // The caller may have given up waiting; nothing to do then.
        let _ = request.respond_to.send(result);
    }
}
