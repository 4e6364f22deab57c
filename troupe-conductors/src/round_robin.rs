//! Deterministic rotation through the active roster.

use async_trait::async_trait;
use std::sync::Arc;
use troupe_core::chat::Chat;
use troupe_core::conduct::{Conductor, TERMINATION_MARKER};
use troupe_core::error::ChatError;
use troupe_core::participant::ActiveParticipant;

/// Rotates through the active participants in roster order.
///
/// The next speaker is the one after the last message's sender; a chat
/// with no messages starts at the first active participant. Termination
/// is cooperative: any message whose trimmed content ends with
/// `TERMINATE` stops the rotation, and the marker is stripped from the
/// extracted result.
#[derive(Debug, Default)]
pub struct RoundRobinConductor;

impl RoundRobinConductor {
    /// Create a new round-robin conductor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Conductor for RoundRobinConductor {
    async fn select_next_speaker(
        &mut self,
        chat: &Chat,
    ) -> Result<Option<Arc<dyn ActiveParticipant>>, ChatError> {
        // An emptied-out roster ends the rotation; run_dialog guards the
        // start of the conversation separately.
        let actives = chat.active_participants().await;
        if actives.is_empty() {
            return Ok(None);
        }

        let messages = chat.messages().await?;
        let last = match messages.last() {
            Some(last) => last,
            None => return Ok(Some(actives[0].clone())),
        };

        if last.content.trim().ends_with(TERMINATION_MARKER) {
            return Ok(None);
        }

        // A sender that has since left the roster restarts the rotation.
        let next_index = actives
            .iter()
            .position(|p| p.name() == last.sender_name)
            .map(|i| (i + 1) % actives.len())
            .unwrap_or(0);

        Ok(Some(actives[next_index].clone()))
    }

    async fn chat_result(&self, chat: &Chat) -> Result<String, ChatError> {
        let content = chat
            .messages()
            .await?
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        Ok(match content.rfind(TERMINATION_MARKER) {
            Some(idx) => content[..idx].trim().to_string(),
            None => content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use troupe_core::conduct::Opening;
    use troupe_core::participant::RosterMember;
    use troupe_core::test_utils::{SilentRenderer, StaticParticipant};
    use troupe_ledger_memory::InMemoryLedger;

    async fn chat_with(names: &[&str]) -> Chat {
        let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        for name in names {
            chat.add_participant(RosterMember::active(StaticParticipant::new(*name, "ok")))
                .await
                .unwrap();
        }
        chat
    }

    #[tokio::test]
    async fn starts_with_first_active() {
        let chat = chat_with(&["Alice", "Bob"]).await;
        let mut conductor = RoundRobinConductor::new();
        let speaker = conductor.select_next_speaker(&chat).await.unwrap().unwrap();
        assert_eq!(speaker.name(), "Alice");
    }

    #[tokio::test]
    async fn rotates_in_roster_order() {
        let chat = chat_with(&["Alice", "Bob", "Carol"]).await;
        let mut conductor = RoundRobinConductor::new();

        chat.add_message("Alice", "hi").await.unwrap();
        let speaker = conductor.select_next_speaker(&chat).await.unwrap().unwrap();
        assert_eq!(speaker.name(), "Bob");

        chat.add_message("Carol", "wrapping around").await.unwrap();
        let speaker = conductor.select_next_speaker(&chat).await.unwrap().unwrap();
        assert_eq!(speaker.name(), "Alice");
    }

    #[tokio::test]
    async fn departed_sender_restarts_rotation() {
        let chat = chat_with(&["Alice", "Bob"]).await;
        let mut conductor = RoundRobinConductor::new();
        chat.add_message("Bob", "leaving").await.unwrap();
        chat.remove_participant("Bob").await.unwrap();

        let speaker = conductor.select_next_speaker(&chat).await.unwrap().unwrap();
        assert_eq!(speaker.name(), "Alice");
    }

    #[tokio::test]
    async fn termination_marker_stops_selection() {
        let chat = chat_with(&["Alice", "Bob"]).await;
        let mut conductor = RoundRobinConductor::new();
        chat.add_message("Alice", "done here TERMINATE").await.unwrap();
        assert!(conductor.select_next_speaker(&chat).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn result_strips_the_marker() {
        let chat = chat_with(&["Alice"]).await;
        let conductor = RoundRobinConductor::new();
        chat.add_message("Alice", "the answer is 42 TERMINATE")
            .await
            .unwrap();
        assert_eq!(conductor.chat_result(&chat).await.unwrap(), "the answer is 42");
    }

    #[tokio::test]
    async fn empty_roster_ends_selection() {
        let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        let mut conductor = RoundRobinConductor::new();
        assert!(conductor.select_next_speaker(&chat).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn full_dialog_terminates_and_extracts_result() {
        let chat = chat_with(&["Bob"]).await;
        // Replace Bob with one whose scripted reply ends the conversation.
        chat.remove_participant("Bob").await.unwrap();
        chat.add_participant(RosterMember::active(StaticParticipant::new(
            "Bob",
            "ok TERMINATE",
        )))
        .await
        .unwrap();

        let mut conductor = RoundRobinConductor::new();
        let result = conductor
            .run_dialog(&chat, Some(Opening::new("Hi").from_sender("Bob")))
            .await
            .unwrap();
        assert_eq!(result, "ok");
        assert_eq!(chat.messages().await.unwrap().len(), 2);
    }
}
