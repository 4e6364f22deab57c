//! The Conductor protocol — the turn-taking state machine.
//!
//! A conductor decides who speaks next and when the conversation stops.
//! The driving loop lives here as a provided method so every strategy
//! (deterministic rotation, model-driven selection, custom) shares the
//! same lifecycle: prepare → start hooks → opening message → turn loop →
//! end hooks → result extraction.

use crate::chat::Chat;
use crate::error::ChatError;
use crate::participant::{ActiveParticipant, Participant};
use async_trait::async_trait;
use std::sync::Arc;

/// The literal token that marks a message as a termination request.
pub const TERMINATION_MARKER: &str = "TERMINATE";

/// The reserved participant name the interrupt hand-off reroutes to.
pub const USER_PARTICIPANT_NAME: &str = "User";

/// Optional opening message for a dialog.
///
/// If no sender is named, the first active participant (roster order)
/// is used.
#[derive(Debug, Clone)]
pub struct Opening {
    content: String,
    sender: Option<String>,
}

impl Opening {
    /// An opening message attributed to the first active participant.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: None,
        }
    }

    /// Attribute the opening message to a specific participant.
    pub fn from_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// The opening content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The named sender, if any.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }
}

/// Strategy object deciding turn order and termination for one conversation.
///
/// A conductor is stateless with respect to the ledger; it holds only its
/// own steering configuration (and possibly a one-shot initialization
/// latch). A fresh conductor is expected per conversation.
#[async_trait]
pub trait Conductor: Send + Sync {
    /// Choose the next speaker, or `None` to terminate the conversation.
    async fn select_next_speaker(
        &mut self,
        chat: &Chat,
    ) -> Result<Option<Arc<dyn ActiveParticipant>>, ChatError>;

    /// One-time setup hook, called at the top of [`run_dialog`]. May mutate
    /// the roster (composition generation). Implementations that do real
    /// work here must make it idempotent per conductor instance.
    ///
    /// [`run_dialog`]: Conductor::run_dialog
    async fn prepare(&mut self, _chat: &Chat) -> Result<(), ChatError> {
        Ok(())
    }

    /// Extract the conversation's result from the final ledger.
    /// Default: content of the last message, or empty if there is none.
    async fn chat_result(&self, chat: &Chat) -> Result<String, ChatError> {
        Ok(chat
            .messages()
            .await?
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }

    /// Drive the conversation to completion.
    ///
    /// 1. [`prepare`](Conductor::prepare) (once per conductor instance).
    /// 2. Require ≥ 1 active participant
    ///    ([`ChatError::InsufficientParticipants`]).
    /// 3. Fire `on_chat_started` across the roster.
    /// 4. Append the opening message, if supplied.
    /// 5. Loop: select a speaker; stop on `None` or when the message cap is
    ///    reached; otherwise ask the speaker to respond and append the
    ///    result under its name.
    /// 6. Fire `on_chat_ended` across the roster.
    /// 7. Return [`chat_result`](Conductor::chat_result).
    ///
    /// An [`ChatError::Interrupted`] from a speaker not named `"User"` is
    /// caught once per turn: if an active participant named `"User"` is
    /// joined, that participant responds in the speaker's stead (the
    /// message is still attributed to the interrupted speaker); otherwise
    /// the interrupt propagates and aborts the run. Every other error from
    /// a `respond` call propagates immediately.
    async fn run_dialog(&mut self, chat: &Chat, opening: Option<Opening>) -> Result<String, ChatError> {
        self.prepare(chat).await?;

        let actives = chat.active_participants().await;
        if actives.is_empty() {
            return Err(ChatError::InsufficientParticipants { count: 0 });
        }

        for member in chat.members().await {
            member.on_chat_started(chat).await;
        }

        if let Some(opening) = opening {
            let sender = match opening.sender() {
                Some(sender) => sender.to_string(),
                None => actives[0].name().to_string(),
            };
            chat.add_message(&sender, opening.content()).await?;
        }

        let mut next_speaker = self.select_next_speaker(chat).await?;
        while let Some(speaker) = next_speaker {
            if let Some(cap) = chat.max_messages() {
                if chat.messages().await?.len() >= cap.get() {
                    break;
                }
            }

            let content = match speaker.respond(chat).await {
                Ok(content) => content,
                Err(ChatError::Interrupted) if speaker.name() != USER_PARTICIPANT_NAME => {
                    match chat.active_by_name(USER_PARTICIPANT_NAME).await {
                        Some(user) => user.respond(chat).await?,
                        None => return Err(ChatError::Interrupted),
                    }
                }
                Err(e) => return Err(e),
            };

            chat.add_message(speaker.name(), &content).await?;

            next_speaker = self.select_next_speaker(chat).await?;
        }

        for member in chat.members().await {
            member.on_chat_ended(chat).await;
        }

        self.chat_result(chat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_defaults_to_first_active_sender() {
        let opening = Opening::new("hi");
        assert_eq!(opening.content(), "hi");
        assert!(opening.sender().is_none());
    }

    #[test]
    fn opening_sender_override() {
        let opening = Opening::new("hi").from_sender("Alice");
        assert_eq!(opening.sender(), Some("Alice"));
    }

    // The provided run_dialog body awaits other trait methods; that only
    // type-checks if conductor trait objects are fully thread safe.
    #[test]
    fn conductor_objects_are_thread_safe() {
        fn assert_bounds<T: Send + Sync + ?Sized>() {}
        assert_bounds::<dyn Conductor>();
        assert_bounds::<Box<dyn Conductor>>();
    }
}
