//! # ActorEntity Trait
//!
//! The contract a resource type implements to get one sequential mailbox per key.
//!
//! Unlike a single actor that owns a whole collection, a keyed actor owns exactly one
//! key (e.g. one product). Requests for the same key are handled one at a time, in
//! arrival order; requests for different keys run in parallel on separate tasks.
//! State lives wherever the `Context` points (typically a store), so the actor itself
//! carries nothing but its key.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use super::FrameworkError;

/// Trait for resource types managed by an [`ActorRegistry`](super::ActorRegistry).
///
/// # Async & Context
/// The `Context` is built once, shared behind an `Arc` by every per-key actor, and
/// handed to each call of [`handle_action`](ActorEntity::handle_action).
#[async_trait]
pub trait ActorEntity: Send + Sync + 'static {
    /// The key that partitions work into independent mailboxes.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// Enum representing the operations a keyed actor serializes.
    type Action: Send + Debug + 'static;

    /// The result type returned by actions.
    type ActionResult: Send + Debug + 'static;

    /// Shared dependencies (store handles, configuration).
    type Context: Send + Sync + 'static;

    /// Per-actor error type. Plumbing failures are folded in through `From`.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// Handle one action for `id`. Never runs concurrently with another call for the
    /// same `id` within one registry.
    async fn handle_action(
        id: &Self::Id,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
