//! The Chat facade — the one object other components touch.
//!
//! Wraps a [`Ledger`] + [`Renderer`] pair and fans lifecycle notifications
//! out to the roster. All mutation of conversation state goes through here;
//! conductors and participants never reach into the ledger directly.

use crate::error::ChatError;
use crate::ledger::Ledger;
use crate::message::Message;
use crate::participant::{ActiveParticipant, Participant, RosterMember};
use crate::render::Renderer;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// One bounded conversation: a ledger, a renderer, and steering metadata.
///
/// The message cap, when set, is a hard stop — once the total message count
/// reaches it, the turn loop stops before producing another message.
/// `NonZeroUsize` makes the "cap must be ≥ 1" invariant unrepresentable.
pub struct Chat {
    ledger: Arc<dyn Ledger>,
    renderer: Arc<dyn Renderer>,
    name: Option<String>,
    goal: Option<String>,
    max_messages: Option<NonZeroUsize>,
    hide_messages: bool,
}

impl Chat {
    /// Create a chat over the given ledger and renderer.
    pub fn new(ledger: Arc<dyn Ledger>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            ledger,
            renderer,
            name: None,
            goal: None,
            max_messages: None,
            hide_messages: false,
        }
    }

    /// Name the conversation (shown in rendered output and nested-chat paths).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the free-form goal text steering the conversation.
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    /// Cap the total message count.
    pub fn with_max_messages(mut self, cap: NonZeroUsize) -> Self {
        self.max_messages = Some(cap);
        self
    }

    /// Suppress rendering of every message in this chat.
    pub fn with_hidden_messages(mut self) -> Self {
        self.hide_messages = true;
        self
    }

    /// The conversation name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The conversation goal, if any.
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    /// The hard cap on total message count, if any.
    pub fn max_messages(&self) -> Option<NonZeroUsize> {
        self.max_messages
    }

    /// Whether all messages in this chat are hidden from rendering.
    pub fn messages_hidden(&self) -> bool {
        self.hide_messages
    }

    /// Join a participant to this conversation.
    ///
    /// Fails with [`ChatError::DuplicateParticipant`] before any mutation if
    /// the name exists in either namespace. On success, fans out
    /// `on_participant_joined` to the whole roster (the new member included).
    pub async fn add_participant(&self, member: RosterMember) -> Result<(), ChatError> {
        let name = member.name().to_string();
        if self.ledger.has_active(&name).await || self.ledger.has_passive(&name).await {
            return Err(ChatError::DuplicateParticipant { name });
        }

        self.ledger.add_member(member).await?;

        for member in self.ledger.members().await {
            member.on_participant_joined(self, &name).await;
        }
        Ok(())
    }

    /// Remove a participant by name.
    ///
    /// Fails with [`ChatError::ParticipantNotFound`] if absent. On success,
    /// fans out `on_participant_left` to the remaining roster.
    pub async fn remove_participant(&self, name: &str) -> Result<(), ChatError> {
        self.ledger.remove_member(name).await?;

        for member in self.ledger.members().await {
            member.on_participant_left(self, name).await;
        }
        Ok(())
    }

    /// Append a message from a joined *active* participant.
    ///
    /// Resolves the sender (fails with [`ChatError::ParticipantNotJoined`]
    /// if absent or passive), appends to the ledger, renders unless the
    /// chat's or the sender's hide flag suppresses it, then fans out
    /// `on_new_message` to every roster member in roster order, the sender
    /// included.
    pub async fn add_message(&self, sender_name: &str, content: &str) -> Result<Message, ChatError> {
        let sender = self
            .ledger
            .active_by_name(sender_name)
            .await
            .ok_or_else(|| ChatError::ParticipantNotJoined {
                name: sender_name.to_string(),
            })?;

        let message = self.ledger.append(sender_name, content, None).await?;

        if !self.hide_messages && !sender.messages_hidden() {
            self.renderer.render(self, &message).await;
        }

        for member in self.ledger.members().await {
            member.on_new_message(self, &message).await;
        }

        Ok(message)
    }

    /// All messages in insertion order.
    pub async fn messages(&self) -> Result<Vec<Message>, ChatError> {
        self.ledger.messages().await
    }

    /// Remove all messages and reset the id counter.
    pub async fn clear_messages(&self) -> Result<(), ChatError> {
        self.ledger.clear().await
    }

    /// All roster members in insertion order.
    pub async fn members(&self) -> Vec<RosterMember> {
        self.ledger.members().await
    }

    /// Active participants in roster order.
    pub async fn active_participants(&self) -> Vec<Arc<dyn ActiveParticipant>> {
        self.ledger.active_participants().await
    }

    /// Passive participants in roster order.
    pub async fn passive_participants(&self) -> Vec<Arc<dyn Participant>> {
        self.ledger.passive_participants().await
    }

    /// Look up an active participant by name.
    pub async fn active_by_name(&self, name: &str) -> Option<Arc<dyn ActiveParticipant>> {
        self.ledger.active_by_name(name).await
    }

    /// Look up a passive participant by name.
    pub async fn passive_by_name(&self, name: &str) -> Option<Arc<dyn Participant>> {
        self.ledger.passive_by_name(name).await
    }

    /// Whether an active participant with this name is joined.
    pub async fn has_active(&self, name: &str) -> bool {
        self.ledger.has_active(name).await
    }

    /// Whether a passive participant with this name is joined.
    pub async fn has_passive(&self, name: &str) -> bool {
        self.ledger.has_passive(name).await
    }

    /// Detailed descriptions of all active participants, blank-line
    /// separated, for use in model-facing prompts.
    pub async fn roster_summary(&self) -> String {
        self.ledger
            .active_participants()
            .await
            .iter()
            .map(|p| p.detailed(0))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
