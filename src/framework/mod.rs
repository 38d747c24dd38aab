//! Generic keyed-actor framework.
//!
//! One sequential mailbox per key, spawned on demand and evicted when idle.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait a resource type implements to get per-key actors
//! - [`KeyedActor`] - The task that drains one key's mailbox
//! - [`ActorRegistry`] - Get-or-spawn table of mailboxes; the only way to reach an actor
//! - [`FrameworkError`] - Plumbing failures, folded into the entity's error type

mod actor;
mod entity;
mod error;
mod message;
mod registry;

pub use actor::KeyedActor;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ActionRequest, Response};
pub use registry::{ActorRegistry, RegistryConfig};
