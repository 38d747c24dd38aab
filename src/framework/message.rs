//! # Mailbox Messages
//!
//! The envelope carried from the [`ActorRegistry`](super::ActorRegistry) to a
//! [`KeyedActor`](super::KeyedActor).

use super::ActorEntity;
use std::fmt;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T, E> = oneshot::Sender<Result<T, E>>;

/// One queued action plus the channel its result goes back on.
pub struct ActionRequest<T: ActorEntity> {
    pub action: T::Action,
    pub respond_to: Response<T::ActionResult, T::Error>,
}

impl<T: ActorEntity> fmt::Debug for ActionRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}
