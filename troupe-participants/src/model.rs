//! Completion-service-backed participant.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use troupe_core::chat::Chat;
use troupe_core::completion::{ChatTurn, Completion, ToolDefinition};
use troupe_core::error::ChatError;
use troupe_core::participant::{ActiveParticipant, Participant};
use troupe_core::prompt::{Section, render_sections};

/// Answers each turn through a completion service.
///
/// The system prompt is rebuilt on every turn from the participant's own
/// identity, the chat's goal, and the live roster, so the participant
/// tracks roster changes without holding any conversation state itself.
pub struct ModelParticipant {
    name: String,
    role: String,
    mission: Option<String>,
    symbol: String,
    hidden: bool,
    tools: Vec<ToolDefinition>,
    completion: Arc<dyn Completion>,
}

impl ModelParticipant {
    /// Create a participant with the default role of `AI Assistant`.
    pub fn new(name: impl Into<String>, completion: Arc<dyn Completion>) -> Self {
        Self {
            name: name.into(),
            role: "AI Assistant".to_string(),
            mission: None,
            symbol: "🤖".to_string(),
            hidden: false,
            tools: Vec::new(),
            completion,
        }
    }

    /// Set the role shown to other participants and to the model.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set the personal mission text.
    pub fn with_mission(mut self, mission: impl Into<String>) -> Self {
        self.mission = Some(mission.into());
        self
    }

    /// Set the display symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Offer a tool to the completion service on every turn.
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    /// Hide this participant's messages from rendering.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// The tools offered on every turn.
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    async fn system_prompt(&self, chat: &Chat) -> String {
        let mut identity = Section::new("Identity")
            .item(format!("Name: {}", self.name))
            .item(format!("Role: {}", self.role));
        if let Some(mission) = &self.mission {
            identity = identity.item(format!("Mission: {mission}"));
        }

        let mut sections = vec![identity];

        let mut context = Section::new("Chat");
        if let Some(name) = chat.name() {
            context = context.item(format!("Name: {name}"));
        }
        if let Some(goal) = chat.goal() {
            context = context.item(format!("Goal: {goal}"));
        }
        sections.push(context);

        sections.push(Section::new("Participants").text(chat.roster_summary().await));

        sections.push(
            Section::new("Rules")
                .item(format!("Respond only as {}.", self.name))
                .item("Do not prefix your answer with your own name.")
                .item("Stay in character and keep your mission in mind."),
        );

        render_sections(&sections)
    }

    async fn history_turns(&self, chat: &Chat) -> Result<Vec<ChatTurn>, ChatError> {
        let messages = chat.messages().await?;
        if messages.is_empty() {
            return Ok(vec![ChatTurn::user("The conversation has just begun.")]);
        }
        Ok(messages
            .iter()
            .map(|m| {
                if m.sender_name == self.name {
                    ChatTurn::assistant(m.content.clone())
                } else {
                    ChatTurn::user(format!("{}: {}", m.sender_name, m.content))
                }
            })
            .collect())
    }
}

impl Participant for ModelParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    fn detailed(&self, level: usize) -> String {
        let prefix = "    ".repeat(level);
        let mut out = format!(
            "{prefix}Name: {}\n{prefix}Role: {}",
            self.name, self.role
        );
        if let Some(mission) = &self.mission {
            out.push_str(&format!("\n{prefix}Mission: {mission}"));
        }
        out
    }
}

#[async_trait]
impl ActiveParticipant for ModelParticipant {
    async fn respond(&self, chat: &Chat) -> Result<String, ChatError> {
        let mut turns = vec![ChatTurn::system(self.system_prompt(chat).await)];
        turns.extend(self.history_turns(chat).await?);

        debug!(participant = %self.name, turns = turns.len(), "requesting completion");
        let response = self.completion.complete(&turns, &self.tools).await?;

        // Models sometimes echo the speaker label despite the rules.
        let prefix = format!("{}:", self.name);
        let response = match response.trim().strip_prefix(&prefix) {
            Some(stripped) => stripped.trim_start().to_string(),
            None => response,
        };

        Ok(response)
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn messages_hidden(&self) -> bool {
        self.hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::participant::RosterMember;
    use troupe_core::test_utils::{ScriptedCompletion, SilentRenderer};
    use troupe_ledger_memory::InMemoryLedger;

    fn participant(replies: &[&str]) -> (ModelParticipant, Arc<ScriptedCompletion>) {
        let completion = Arc::new(ScriptedCompletion::new(replies.iter().copied()));
        let participant = ModelParticipant::new("Sage", completion.clone())
            .with_role("Advisor")
            .with_mission("Give short answers.");
        (participant, completion)
    }

    async fn empty_chat() -> Chat {
        Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer))
    }

    #[tokio::test]
    async fn responds_with_the_completion_text() {
        let (participant, _) = participant(&["forty-two"]);
        let chat = empty_chat().await;
        assert_eq!(participant.respond(&chat).await.unwrap(), "forty-two");
    }

    #[tokio::test]
    async fn strips_an_echoed_name_prefix() {
        let (participant, _) = participant(&["Sage: forty-two"]);
        let chat = empty_chat().await;
        assert_eq!(participant.respond(&chat).await.unwrap(), "forty-two");
    }

    #[tokio::test]
    async fn history_maps_own_messages_to_assistant_turns() {
        let (participant, _) = participant(&[]);
        let chat = empty_chat().await;
        chat.add_participant(RosterMember::active(ModelParticipant::new(
            "Sage",
            Arc::new(ScriptedCompletion::new(Vec::<String>::new())),
        )))
        .await
        .unwrap();
        chat.add_participant(RosterMember::active(ModelParticipant::new(
            "Scribe",
            Arc::new(ScriptedCompletion::new(Vec::<String>::new())),
        )))
        .await
        .unwrap();
        chat.add_message("Scribe", "any advice?").await.unwrap();
        chat.add_message("Sage", "measure twice").await.unwrap();

        let turns = participant.history_turns(&chat).await.unwrap();
        assert_eq!(turns[0], ChatTurn::user("Scribe: any advice?"));
        assert_eq!(turns[1], ChatTurn::assistant("measure twice"));
    }

    #[test]
    fn detailed_lists_identity_lines() {
        let (participant, _) = participant(&[]);
        assert_eq!(
            participant.detailed(1),
            "    Name: Sage\n    Role: Advisor\n    Mission: Give short answers."
        );
    }
}
