//! A nested conversation behind the single-participant surface.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use troupe_core::chat::Chat;
use troupe_core::conduct::{Conductor, Opening};
use troupe_core::error::ChatError;
use troupe_core::participant::{ActiveParticipant, Participant, RosterMember};

struct Inner {
    chat: Chat,
    conductor: Box<dyn Conductor>,
}

/// An entire team answering as one participant.
///
/// `respond` relays the outer conversation into the wrapped chat as an
/// opening message attributed to the team's leader (the first active
/// inner participant after the inner conductor prepares), runs the inner
/// dialog to completion, then asks the leader to restate the outcome as
/// the group's single outer message. Because the group is just an
/// [`ActiveParticipant`], teams nest to any depth.
///
/// The inner conductor's state carries across outer turns; pass
/// `fresh_history()` to clear the inner ledger before each response
/// instead.
pub struct GroupParticipant {
    name: String,
    mission: Option<String>,
    symbol: String,
    clear_before_respond: bool,
    // Inner member descriptions captured at construction, indent level 0.
    member_summaries: Vec<String>,
    inner: Mutex<Inner>,
}

impl GroupParticipant {
    /// Wrap a chat and conductor as a single participant.
    pub async fn new(
        name: impl Into<String>,
        chat: Chat,
        conductor: Box<dyn Conductor>,
    ) -> Self {
        let member_summaries = chat
            .members()
            .await
            .iter()
            .map(|m| m.detailed(0))
            .collect();
        Self {
            name: name.into(),
            mission: None,
            symbol: "🤝".to_string(),
            clear_before_respond: false,
            member_summaries,
            inner: Mutex::new(Inner {
                chat,
                conductor,
            }),
        }
    }

    /// Set the team's mission text.
    pub fn with_mission(mut self, mission: impl Into<String>) -> Self {
        self.mission = Some(mission.into());
        self
    }

    /// Set the display symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Clear the inner ledger before every response.
    pub fn fresh_history(mut self) -> Self {
        self.clear_before_respond = true;
        self
    }

    async fn relay_request(&self, outer: &Chat) -> Result<String, ChatError> {
        let messages = outer.messages().await?;
        if messages.is_empty() {
            return Ok(outer
                .goal()
                .map(str::to_string)
                .unwrap_or_else(|| "Begin the conversation.".to_string()));
        }

        let transcript = messages
            .iter()
            .map(|m| format!("{}: {}", m.sender_name, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!(
            "The following outside conversation needs our team's response:\n\n\
             {transcript}\n\n\
             Work out the response together; the final message becomes our answer."
        ))
    }
}

impl Participant for GroupParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    fn detailed(&self, level: usize) -> String {
        let prefix = "    ".repeat(level);
        let mut out = format!("{prefix}Name: {}\n{prefix}Role: Team", self.name);
        if let Some(mission) = &self.mission {
            out.push_str(&format!("\n{prefix}Mission: {mission}"));
        }
        if !self.member_summaries.is_empty() {
            out.push_str(&format!("\n{prefix}Members:"));
            for summary in &self.member_summaries {
                for line in summary.lines() {
                    out.push_str(&format!("\n{prefix}    {line}"));
                }
            }
        }
        out
    }
}

#[async_trait]
impl ActiveParticipant for GroupParticipant {
    async fn respond(&self, outer: &Chat) -> Result<String, ChatError> {
        let request = self.relay_request(outer).await?;

        let mut inner = self.inner.lock().await;
        if self.clear_before_respond {
            inner.chat.clear_messages().await?;
        }

        debug!(group = %self.name, "running nested dialog");
        // No explicit sender: the dialog attributes the opening to the
        // team's leader once the inner conductor has prepared the roster.
        let inner = &mut *inner;
        let outcome = inner
            .conductor
            .run_dialog(&inner.chat, Some(Opening::new(request)))
            .await?;

        let leader = inner.chat.active_participants().await.into_iter().next();
        match leader {
            Some(leader) => {
                let query = format!(
                    "Our team's internal discussion concluded with:\n\n{outcome}\n\n\
                     Relay the conclusion as one message to the outside \
                     conversation, speaking for the whole team."
                );
                crate::request_response(query, RosterMember::Active(leader)).await
            }
            None => Ok(outcome),
        }
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use troupe_conductors::RoundRobinConductor;
    use troupe_core::participant::RosterMember;
    use troupe_core::test_utils::{SilentRenderer, StaticParticipant};
    use troupe_ledger_memory::InMemoryLedger;

    async fn inner_chat() -> Chat {
        let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        chat.add_participant(RosterMember::active(StaticParticipant::new(
            "Solver",
            "the answer is 4 TERMINATE",
        )))
        .await
        .unwrap();
        chat
    }

    #[tokio::test]
    async fn nested_dialog_result_becomes_the_response() {
        let group = GroupParticipant::new(
            "Mathletes",
            inner_chat().await,
            Box::new(RoundRobinConductor::new()),
        )
        .await;

        let outer = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        outer
            .add_participant(RosterMember::active(StaticParticipant::new("Asker", "2+2?")))
            .await
            .unwrap();
        outer.add_message("Asker", "what is 2+2?").await.unwrap();

        let answer = group.respond(&outer).await.unwrap();
        assert_eq!(answer, "the answer is 4");
    }

    #[tokio::test]
    async fn empty_outer_chat_still_produces_a_response() {
        let group = GroupParticipant::new(
            "Mathletes",
            inner_chat().await,
            Box::new(RoundRobinConductor::new()),
        )
        .await;

        let outer = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer))
            .with_goal("compute 2+2");
        let answer = group.respond(&outer).await.unwrap();
        assert_eq!(answer, "the answer is 4");
    }

    #[tokio::test]
    async fn empty_inner_roster_is_an_error() {
        let empty = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        let group =
            GroupParticipant::new("Nobody", empty, Box::new(RoundRobinConductor::new())).await;

        let outer = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        assert!(matches!(
            group.respond(&outer).await,
            Err(ChatError::InsufficientParticipants { count: 0 })
        ));
    }

    #[tokio::test]
    async fn detailed_lists_members_indented() {
        let group = GroupParticipant::new(
            "Mathletes",
            inner_chat().await,
            Box::new(RoundRobinConductor::new()),
        )
        .await
        .with_mission("Solve arithmetic.");

        let detailed = group.detailed(0);
        assert!(detailed.starts_with("Name: Mathletes"));
        assert!(detailed.contains("Mission: Solve arithmetic."));
        assert!(detailed.contains("    Name: Solver"));
    }
}
