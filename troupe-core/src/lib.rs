//! # troupe-core — protocol traits for turn-based multi-participant conversations
//!
//! This crate defines the seams that compose into a conversation engine:
//!
//! | Concern | Trait / type | What it does |
//! |---------|--------------|--------------|
//! | Ledger | [`Ledger`] | Ordered, append-only message store + roster |
//! | Participant | [`Participant`], [`ActiveParticipant`] | Who converses, and who may speak |
//! | Facade | [`Chat`] | The one object other components touch |
//! | Turn-taking | [`Conductor`] | Who speaks next, and when to stop |
//! | Composition | [`CompositionGenerator`] | (Re)computing the roster on demand |
//! | Rendering | [`Renderer`] | Side-effect-only message sink |
//! | Completion | [`Completion`] | External chat-model capability |
//! | Coercion | [`Coercer`] | Free text → validated structured value |
//!
//! ## Design principle
//!
//! Traits are operation-defined, not mechanism-defined.
//! [`ActiveParticipant::respond`] means "produce this participant's next
//! message" — whether that is a model call, a blocking read from a human,
//! or an entire nested conversation run to completion is the
//! implementation's concern. That is what lets a team of agents stand in
//! for a single agent without the caller noticing.
//!
//! ## Concurrency model
//!
//! Strictly sequential and cooperative: at most one participant is ever
//! speaking, and the ledger is touched only through its owning [`Chat`].
//! The traits are async because responses suspend on external calls, not
//! because anything runs in parallel.

#![deny(missing_docs)]

pub mod chat;
pub mod coerce;
pub mod completion;
pub mod compose;
pub mod conduct;
pub mod error;
pub mod ledger;
pub mod message;
pub mod participant;
pub mod prompt;
pub mod render;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use chat::Chat;
pub use coerce::{Coercer, CoercionError, JsonCoercer, coerce_into};
pub use completion::{ChatTurn, Completion, CompletionError, Role, ToolDefinition};
pub use compose::{Composition, CompositionGenerator, CompositionRequest};
pub use conduct::{Conductor, Opening, TERMINATION_MARKER, USER_PARTICIPANT_NAME};
pub use error::ChatError;
pub use ledger::Ledger;
pub use message::{Message, SYSTEM_SENDER, UNPARSED_MESSAGE_ID};
pub use participant::{ActiveParticipant, Participant, Roster, RosterMember};
pub use prompt::{Section, render_sections};
pub use render::Renderer;
