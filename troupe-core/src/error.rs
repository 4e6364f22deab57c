//! The engine's error taxonomy.

use thiserror::Error;

/// Errors raised by the conversation engine.
///
/// All variants are local, synchronous failures raised at the point of the
/// invalid operation. External-interface failures ([`CompletionError`],
/// [`CoercionError`]) convert into this type when they abort a run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChatError {
    /// A participant with this name already exists in the chat, in either
    /// the active or the passive namespace.
    #[error("participant \"{name}\" has already joined this chat")]
    DuplicateParticipant {
        /// The name that collided.
        name: String,
    },

    /// A removal targeted a participant that is not part of the chat.
    #[error("participant \"{name}\" is not joined to this chat")]
    ParticipantNotFound {
        /// The name that was not found.
        name: String,
    },

    /// A message was attributed to a name that is not a joined *active*
    /// participant.
    #[error("no active participant named \"{name}\" is joined to this chat")]
    ParticipantNotJoined {
        /// The offending sender name.
        name: String,
    },

    /// A dialog was started without any active participants.
    #[error("not enough active participants in this chat ({count})")]
    InsufficientParticipants {
        /// How many active participants were present.
        count: usize,
    },

    /// An operation required at least one message, but the ledger is empty.
    #[error("there are no messages in this chat")]
    EmptyLedger,

    /// A response was interrupted (ctrl-c, closed input stream). The
    /// driving loop reroutes this to a human participant named `"User"`
    /// when one is present; otherwise it aborts the run.
    #[error("interrupted while waiting for a response")]
    Interrupted,

    /// The ledger's backing store failed.
    #[error("ledger backend error: {0}")]
    Ledger(String),

    /// A completion-service call failed.
    #[error("completion error: {0}")]
    Completion(#[from] crate::completion::CompletionError),

    /// Structured-output coercion failed.
    #[error("coercion error: {0}")]
    Coercion(#[from] crate::coerce::CoercionError),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
