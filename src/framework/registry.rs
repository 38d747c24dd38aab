//! # Actor Registry
//!
//! The "client" half: a keyed table of live mailboxes. It spawns a
//! [`KeyedActor`](super::KeyedActor) on first use of a key, reuses it while it is
//! alive, and forgets it once it has been evicted for idleness. Memory is bounded by
//! the number of recently active keys, not by every key ever seen.

use super::actor::{KeyedActor, Lease};
use super::{ActionRequest, ActorEntity, FrameworkError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// A mailbox can close between lookup and send (idle eviction). One retry with a
/// fresh actor is always enough; the bound only guards against a pathological loop.
const MAX_DELIVERY_ATTEMPTS: usize = 3;

struct Mailbox<T: ActorEntity> {
    sender: mpsc::Sender<ActionRequest<T>>,
    lease: Lease,
}

impl<T: ActorEntity> Mailbox<T> {
    /// Closed and no actor holds the lease any more.
    fn is_dead(&self) -> bool {
        self.sender.is_closed() && Arc::strong_count(&self.lease) == 1
    }
}

/// Sizing for the per-key actors spawned by a registry.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Capacity of each key's mailbox. Senders wait when it is full.
    pub mailbox_capacity: usize,
    /// How long an actor waits for work before it is evicted.
    pub idle_timeout: Duration,
}

/// Routes actions to one sequential actor per key.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct ActorRegistry<T: ActorEntity> {
    mailboxes: Mutex<HashMap<T::Id, Mailbox<T>>>,
    tasks: Mutex<JoinSet<()>>,
    context: Arc<T::Context>,
    config: RegistryConfig,
    closed: AtomicBool,
}

impl<T: ActorEntity> ActorRegistry<T> {
    pub fn new(context: T::Context, config: RegistryConfig) -> Self {
        Self {
            mailboxes: Mutex::new(HashMap::new()),
            tasks: Mutex::new(JoinSet::new()),
            context: Arc::new(context),
            config: RegistryConfig {
                mailbox_capacity: config.mailbox_capacity.max(1),
                ..config
            },
            closed: AtomicBool::new(false),
        }
    }

    /// The shared context every actor of this registry receives.
    pub fn context(&self) -> &T::Context {
        &self.context
    }

    /// Sends `action` to the actor for `id` and waits for its result.
    ///
    /// Must be called from within a Tokio runtime: the first request for a key spawns
    /// its actor.
    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, T::Error> {
        let (respond_to, response) = oneshot::channel();
        let mut request = ActionRequest { action, respond_to };

        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            let sender = self.mailbox(&id)?;
            match sender.send(request).await {
                Ok(()) => {
                    return match response.await {
                        Ok(result) => result,
                        Err(_) => Err(FrameworkError::ActorDropped.into()),
                    };
                }
                Err(mpsc::error::SendError(returned)) => {
                    debug!(%id, "Mailbox closed, respawning");
                    request = returned;
                }
            }
        }
        Err(FrameworkError::ActorClosed.into())
    }

    /// Number of keys with a live actor.
    pub fn len(&self) -> usize {
        self.lock_mailboxes()
            .map(|mailboxes| mailboxes.values().filter(|m| !m.sender.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops accepting work, lets every actor finish its queue and waits for them.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the senders lets each actor drain and exit.
        let actors = match self.lock_mailboxes() {
            Ok(mut mailboxes) => {
                let n = mailboxes.len();
                mailboxes.clear();
                n
            }
            Err(_) => 0,
        };
        let mut tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => JoinSet::new(),
        };
        while tasks.join_next().await.is_some() {}
        info!(actors, "Registry shut down");
    }

    /// Returns a live sender for `id`, spawning an actor if needed.
    fn mailbox(&self, id: &T::Id) -> Result<mpsc::Sender<ActionRequest<T>>, FrameworkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FrameworkError::ActorClosed);
        }
        let mut mailboxes = self.lock_mailboxes()?;

        let lease = match mailboxes.get(id) {
            Some(mailbox) if !mailbox.sender.is_closed() => return Ok(mailbox.sender.clone()),
            // Reuse the lease so the new actor waits for the one still draining.
            Some(mailbox) => mailbox.lease.clone(),
            None => Lease::default(),
        };

        mailboxes.retain(|key, mailbox| key == id || !mailbox.is_dead());

        let (sender, receiver) = mpsc::channel(self.config.mailbox_capacity);
        let actor = KeyedActor::<T>::new(
            id.clone(),
            receiver,
            self.context.clone(),
            lease.clone(),
            self.config.idle_timeout,
        );
        {
            let mut tasks = self.tasks.lock().map_err(|_| FrameworkError::Poisoned)?;
            // Reap finished actors so the set does not grow with every eviction.
            while tasks.try_join_next().is_some() {}
            tasks.spawn(actor.run());
        }
        mailboxes.insert(
            id.clone(),
            Mailbox {
                sender: sender.clone(),
                lease,
            },
        );
        debug!(%id, live = mailboxes.len(), "Spawned actor");
        Ok(sender)
    }

    fn lock_mailboxes(&self) -> Result<MutexGuard<'_, HashMap<T::Id, Mailbox<T>>>, FrameworkError> {
        self.mailboxes.lock().map_err(|_| FrameworkError::Poisoned)
    }
}
