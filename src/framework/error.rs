//! # Framework Errors
//!
//! Failures of the actor plumbing itself, as opposed to the entity's own errors.

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameworkError {
    /// The registry has shut down, or no live mailbox could be reached.
    #[error("Actor closed")]
    ActorClosed,
    /// The actor went away before answering (e.g. it panicked mid-request).
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Registry lock poisoned")]
    Poisoned,
}
