//! The Composition protocol — on-demand (re)computation of the roster.
//!
//! A composition generator proposes a new roster plus updated steering
//! text. It never mutates the conversation itself; the driving conductor
//! diffs the result against the live roster and issues the actual
//! add/remove calls.

use crate::chat::Chat;
use crate::error::ChatError;
use crate::participant::RosterMember;
use async_trait::async_trait;

/// Inputs to a composition pass, all optional.
#[derive(Debug, Clone, Default)]
pub struct CompositionRequest {
    /// Free-text suggestion steering the composition.
    pub suggestion: Option<String>,
    /// The current interaction-schema text, if any.
    pub interaction_schema: Option<String>,
    /// The current termination-condition text, if any.
    pub termination_condition: Option<String>,
}

/// The transient result of one composition pass: the participants that
/// should become the new roster, in order, plus updated steering text.
/// Applied immediately by the conductor, then discarded.
pub struct Composition {
    /// The new roster, in summoning order. The first active member is
    /// treated as the group's leader.
    pub roster: Vec<RosterMember>,
    /// Updated interaction-schema text.
    pub interaction_schema: Option<String>,
    /// Updated termination-condition text.
    pub termination_condition: Option<String>,
}

/// Computes a conversation's roster and steering policy, possibly
/// instantiating nested conductors and participants recursively
/// (teams of teams).
#[async_trait]
pub trait CompositionGenerator: Send + Sync {
    /// Produce a composition for the chat. Invoked at most once per
    /// conductor instance, lazily on first `prepare`.
    async fn generate(
        &self,
        chat: &Chat,
        request: CompositionRequest,
    ) -> Result<Composition, ChatError>;
}
