//! Participants — the polymorphic units a conversation is made of.
//!
//! Two capability levels: every roster member implements [`Participant`]
//! (a named identity receiving lifecycle notifications); members that can
//! actually produce the next message additionally implement
//! [`ActiveParticipant`]. "Passive" is simply the absence of the respond
//! capability, not a separate kind.

use crate::chat::Chat;
use crate::error::ChatError;
use crate::message::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// A named identity joined to a conversation.
///
/// Lifecycle hooks default to no-ops; implementations override only what
/// they observe. Hooks are notifications, not control flow — they cannot
/// veto or reorder anything.
#[async_trait]
pub trait Participant: Send + Sync {
    /// The participant's name, unique within one conversation.
    fn name(&self) -> &str;

    /// Called once when a dialog starts.
    async fn on_chat_started(&self, _chat: &Chat) {}

    /// Called once when a dialog ends.
    async fn on_chat_ended(&self, _chat: &Chat) {}

    /// Called for every appended message, in roster order, including the
    /// sender's own messages.
    async fn on_new_message(&self, _chat: &Chat, _message: &Message) {}

    /// Called after a participant joined the chat.
    async fn on_participant_joined(&self, _chat: &Chat, _name: &str) {}

    /// Called after a participant left the chat.
    async fn on_participant_left(&self, _chat: &Chat, _name: &str) {}

    /// Indented multi-line description, used in roster summaries shown to
    /// models. `level` controls the indent depth for nested groups.
    fn detailed(&self, level: usize) -> String {
        let prefix = "    ".repeat(level);
        format!("{prefix}Name: {}", self.name())
    }
}

/// A participant capable of producing the next message.
#[async_trait]
pub trait ActiveParticipant: Participant {
    /// Produce this participant's next message given the full conversation.
    ///
    /// May suspend on external calls (model endpoints, human input).
    /// Returning [`ChatError::Interrupted`] triggers the driving loop's
    /// hand-off to a participant named `"User"`, if one is present.
    async fn respond(&self, chat: &Chat) -> Result<String, ChatError>;

    /// Display symbol shown next to the name in rendered output.
    fn symbol(&self) -> &str {
        "👤"
    }

    /// Whether this participant's own messages are excluded from rendering.
    /// Hidden participants still converse and still receive every hook.
    fn messages_hidden(&self) -> bool {
        false
    }

    /// `symbol name` one-liner for roster listings.
    fn display(&self) -> String {
        format!("{} {}", self.symbol(), self.name())
    }
}

/// A roster entry: either an active or a passive participant.
///
/// The two namespaces share one name space per conversation — no two
/// members may share a name regardless of kind.
#[derive(Clone)]
pub enum RosterMember {
    /// A participant that can speak.
    Active(Arc<dyn ActiveParticipant>),
    /// A named identity that cannot speak.
    Passive(Arc<dyn Participant>),
}

impl RosterMember {
    /// Wrap an active participant.
    pub fn active(participant: impl ActiveParticipant + 'static) -> Self {
        Self::Active(Arc::new(participant))
    }

    /// Wrap a passive participant.
    pub fn passive(participant: impl Participant + 'static) -> Self {
        Self::Passive(Arc::new(participant))
    }

    /// The member's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Active(p) => p.name(),
            Self::Passive(p) => p.name(),
        }
    }

    /// Whether this member can speak.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// The active handle, if this member can speak.
    pub fn as_active(&self) -> Option<Arc<dyn ActiveParticipant>> {
        match self {
            Self::Active(p) => Some(Arc::clone(p)),
            Self::Passive(_) => None,
        }
    }
}

impl std::fmt::Debug for RosterMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active(p) => write!(f, "RosterMember::Active({})", p.name()),
            Self::Passive(p) => write!(f, "RosterMember::Passive({})", p.name()),
        }
    }
}

// Hook fan-out treats active and passive members uniformly; delegating the
// Participant surface here avoids dyn upcasting (rust-version 1.85).
#[async_trait]
impl Participant for RosterMember {
    fn name(&self) -> &str {
        RosterMember::name(self)
    }

    async fn on_chat_started(&self, chat: &Chat) {
        match self {
            Self::Active(p) => p.on_chat_started(chat).await,
            Self::Passive(p) => p.on_chat_started(chat).await,
        }
    }

    async fn on_chat_ended(&self, chat: &Chat) {
        match self {
            Self::Active(p) => p.on_chat_ended(chat).await,
            Self::Passive(p) => p.on_chat_ended(chat).await,
        }
    }

    async fn on_new_message(&self, chat: &Chat, message: &Message) {
        match self {
            Self::Active(p) => p.on_new_message(chat, message).await,
            Self::Passive(p) => p.on_new_message(chat, message).await,
        }
    }

    async fn on_participant_joined(&self, chat: &Chat, name: &str) {
        match self {
            Self::Active(p) => p.on_participant_joined(chat, name).await,
            Self::Passive(p) => p.on_participant_joined(chat, name).await,
        }
    }

    async fn on_participant_left(&self, chat: &Chat, name: &str) {
        match self {
            Self::Active(p) => p.on_participant_left(chat, name).await,
            Self::Passive(p) => p.on_participant_left(chat, name).await,
        }
    }

    fn detailed(&self, level: usize) -> String {
        match self {
            Self::Active(p) => p.detailed(level),
            Self::Passive(p) => p.detailed(level),
        }
    }
}

/// Insertion-ordered roster enforcing the shared name space.
///
/// Both ledger implementations wrap this behind their own lock.
#[derive(Default)]
pub struct Roster {
    members: Vec<RosterMember>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Fails with [`ChatError::DuplicateParticipant`] if any
    /// member (active or passive) already carries the name.
    pub fn add(&mut self, member: RosterMember) -> Result<(), ChatError> {
        if self.members.iter().any(|m| m.name() == member.name()) {
            return Err(ChatError::DuplicateParticipant {
                name: member.name().to_string(),
            });
        }
        self.members.push(member);
        Ok(())
    }

    /// Remove a member by name. Fails with [`ChatError::ParticipantNotFound`]
    /// if no member carries the name.
    pub fn remove(&mut self, name: &str) -> Result<RosterMember, ChatError> {
        match self.members.iter().position(|m| m.name() == name) {
            Some(index) => Ok(self.members.remove(index)),
            None => Err(ChatError::ParticipantNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// All members in insertion order.
    pub fn members(&self) -> Vec<RosterMember> {
        self.members.clone()
    }

    /// Active participants in insertion order.
    pub fn actives(&self) -> Vec<Arc<dyn ActiveParticipant>> {
        self.members.iter().filter_map(RosterMember::as_active).collect()
    }

    /// Passive participants in insertion order.
    pub fn passives(&self) -> Vec<Arc<dyn Participant>> {
        self.members
            .iter()
            .filter_map(|m| match m {
                RosterMember::Passive(p) => Some(Arc::clone(p)),
                RosterMember::Active(_) => None,
            })
            .collect()
    }

    /// Look up an active participant by name.
    pub fn active_by_name(&self, name: &str) -> Option<Arc<dyn ActiveParticipant>> {
        self.members
            .iter()
            .find(|m| m.name() == name)
            .and_then(RosterMember::as_active)
    }

    /// Look up a passive participant by name.
    pub fn passive_by_name(&self, name: &str) -> Option<Arc<dyn Participant>> {
        self.members.iter().find_map(|m| match m {
            RosterMember::Passive(p) if p.name() == name => Some(Arc::clone(p)),
            _ => None,
        })
    }

    /// Whether an active participant with this name is present.
    pub fn has_active(&self, name: &str) -> bool {
        self.active_by_name(name).is_some()
    }

    /// Whether a passive participant with this name is present.
    pub fn has_passive(&self, name: &str) -> bool {
        self.passive_by_name(name).is_some()
    }
}
