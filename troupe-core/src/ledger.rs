//! The Ledger protocol — how one conversation's state persists.
//!
//! A ledger is the single source of truth for a conversation: the ordered,
//! append-only message store plus the participant roster. Implementations:
//! an in-process list (`troupe-ledger-memory`) or a proxy over an external
//! transcript store (`troupe-ledger-transcript`). The trait is deliberately
//! small — append/read/clear plus roster management.

use crate::error::ChatError;
use crate::message::Message;
use crate::participant::{ActiveParticipant, Participant, RosterMember};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Ordered, append-only message store plus roster for one conversation.
///
/// Invariants every implementation must uphold:
/// - `append` assigns ids `1, 2, 3, …` in call order; ids never repeat
///   within one ledger lifetime, even after participants are removed.
/// - `messages` returns insertion order, never reordered.
/// - `clear` resets the store and the id counter.
/// - No two members (active or passive) share a name; checked at add time.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// All messages in insertion order.
    async fn messages(&self) -> Result<Vec<Message>, ChatError>;

    /// Append a message, assigning the next id. `timestamp` defaults to now.
    async fn append(
        &self,
        sender_name: &str,
        content: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Message, ChatError>;

    /// Remove all messages and reset the id counter. The roster is untouched.
    async fn clear(&self) -> Result<(), ChatError>;

    /// Add a roster member. Fails with [`ChatError::DuplicateParticipant`]
    /// if the name exists in either namespace.
    async fn add_member(&self, member: RosterMember) -> Result<(), ChatError>;

    /// Remove a roster member by name. Fails with
    /// [`ChatError::ParticipantNotFound`] if absent.
    async fn remove_member(&self, name: &str) -> Result<RosterMember, ChatError>;

    /// All roster members in insertion order.
    async fn members(&self) -> Vec<RosterMember>;

    /// Active participants in insertion order.
    async fn active_participants(&self) -> Vec<Arc<dyn ActiveParticipant>>;

    /// Passive participants in insertion order.
    async fn passive_participants(&self) -> Vec<Arc<dyn Participant>>;

    /// Look up an active participant by name.
    async fn active_by_name(&self, name: &str) -> Option<Arc<dyn ActiveParticipant>>;

    /// Look up a passive participant by name.
    async fn passive_by_name(&self, name: &str) -> Option<Arc<dyn Participant>>;

    /// Whether an active participant with this name is joined.
    async fn has_active(&self, name: &str) -> bool;

    /// Whether a passive participant with this name is joined.
    async fn has_passive(&self, name: &str) -> bool;
}
