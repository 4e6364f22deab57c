#![deny(missing_docs)]
//! # troupe — umbrella crate
//!
//! Single import surface for the troupe conversation engine. Re-exports
//! the protocol crate and the key implementations behind feature flags,
//! plus a `prelude` for the happy path.

#[cfg(feature = "composition")]
pub use troupe_composition;
#[cfg(feature = "conductors")]
pub use troupe_conductors;
#[cfg(feature = "core")]
pub use troupe_core;
#[cfg(feature = "ledger-memory")]
pub use troupe_ledger_memory;
#[cfg(feature = "ledger-transcript")]
pub use troupe_ledger_transcript;
#[cfg(feature = "participants")]
pub use troupe_participants;
#[cfg(feature = "renderers")]
pub use troupe_renderers;

/// Happy-path imports for composing troupe conversations.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use troupe_core::{
        ActiveParticipant, Chat, ChatError, ChatTurn, Coercer, Completion, CompletionError,
        Composition, CompositionGenerator, CompositionRequest, Conductor, JsonCoercer, Ledger,
        Message, Opening, Participant, Renderer, Role, Roster, RosterMember, Section,
        ToolDefinition, TERMINATION_MARKER, USER_PARTICIPANT_NAME,
    };

    #[cfg(feature = "ledger-memory")]
    pub use troupe_ledger_memory::InMemoryLedger;

    #[cfg(feature = "ledger-transcript")]
    pub use troupe_ledger_transcript::{InMemoryTranscript, TranscriptLedger, TranscriptStore};

    #[cfg(feature = "conductors")]
    pub use troupe_conductors::{ModelConductor, RoundRobinConductor};

    #[cfg(feature = "participants")]
    pub use troupe_participants::{
        GroupParticipant, ModelParticipant, OutputParser, QueuedInput, StdinInput, UserInput,
        UserParticipant, request_response,
    };

    #[cfg(feature = "composition")]
    pub use troupe_composition::ModelCompositionGenerator;

    #[cfg(feature = "renderers")]
    pub use troupe_renderers::{NullRenderer, TerminalRenderer};
}
