#![deny(missing_docs)]
//! Model-driven roster composition.
//!
//! [`ModelCompositionGenerator`] asks a completion service what the ideal
//! team for a conversation looks like and turns the decision into a
//! [`Composition`]: individuals become
//! [`ModelParticipant`](troupe_participants::ModelParticipant)s, teams
//! become [`GroupParticipant`](troupe_participants::GroupParticipant)s
//! wrapping a fresh nested chat whose own conductor carries a nested
//! generator. The recursion is lazy: a nested team is composed the first
//! time it is asked to respond, not when it is summoned.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use troupe_conductors::ModelConductor;
use troupe_core::chat::Chat;
use troupe_core::coerce::{Coercer, JsonCoercer, coerce_into};
use troupe_core::completion::{ChatTurn, Completion, ToolDefinition};
use troupe_core::compose::{Composition, CompositionGenerator, CompositionRequest};
use troupe_core::error::ChatError;
use troupe_core::participant::RosterMember;
use troupe_core::prompt::{Section, render_sections};
use troupe_ledger_memory::InMemoryLedger;
use troupe_participants::{GroupParticipant, ModelParticipant};
use troupe_renderers::NullRenderer;

const MAX_DECISION_RETRIES: usize = 3;

/// The model's composition decision, parsed from coerced JSON.
#[derive(Debug, Deserialize)]
struct Decision {
    #[serde(default)]
    participants_to_remove: Vec<String>,
    #[serde(default)]
    participants_to_add: Vec<NewParticipant>,
    #[serde(default)]
    updated_interaction_schema: Option<String>,
    #[serde(default)]
    updated_termination_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum NewParticipant {
    Individual {
        name: String,
        role: String,
        mission: String,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        tools: Vec<String>,
    },
    Team {
        name: String,
        mission: String,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        composition_suggestion: Option<String>,
    },
}

fn decision_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "participants_to_remove": {
                "type": "array",
                "items": { "type": "string" }
            },
            "participants_to_add": {
                "type": "array",
                "items": {
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": {
                                "type": { "const": "individual" },
                                "name": { "type": "string" },
                                "role": { "type": "string" },
                                "mission": { "type": "string" },
                                "symbol": { "type": "string" },
                                "tools": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["type", "name", "role", "mission"]
                        },
                        {
                            "type": "object",
                            "properties": {
                                "type": { "const": "team" },
                                "name": { "type": "string" },
                                "mission": { "type": "string" },
                                "symbol": { "type": "string" },
                                "composition_suggestion": { "type": "string" }
                            },
                            "required": ["type", "name", "mission"]
                        }
                    ]
                }
            },
            "updated_interaction_schema": { "type": "string" },
            "updated_termination_condition": { "type": "string" }
        }
    })
}

fn resolve_tools(catalogue: &[ToolDefinition], names: &[String]) -> Vec<ToolDefinition> {
    // Unknown tool names are dropped rather than failing the whole team.
    names
        .iter()
        .filter_map(|name| catalogue.iter().find(|t| &t.name == name).cloned())
        .collect()
}

/// Asks a completion service to (re)compose a conversation's roster.
///
/// The decision arrives as JSON (through the configured [`Coercer`]) and
/// names removals, additions, and updated steering text. Additions come
/// in two shapes: individuals, and teams that recurse into nested
/// conversations with their own generator.
#[derive(Clone)]
pub struct ModelCompositionGenerator {
    completion: Arc<dyn Completion>,
    coercer: Arc<dyn Coercer>,
    tool_catalogue: Vec<ToolDefinition>,
}

impl ModelCompositionGenerator {
    /// Create a generator over the given completion service.
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self {
            completion,
            coercer: Arc::new(JsonCoercer),
            tool_catalogue: Vec::new(),
        }
    }

    /// Replace the coercer used to parse the decision.
    pub fn with_coercer(mut self, coercer: Arc<dyn Coercer>) -> Self {
        self.coercer = coercer;
        self
    }

    /// Offer a tool that composed individuals may be granted by name.
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tool_catalogue.push(tool);
        self
    }

    async fn system_prompt(&self, chat: &Chat, request: &CompositionRequest) -> String {
        let mut sections = vec![
            Section::new("Mission").text(
                "Assemble the ideal team of participants for the conversation below. \
                 You may keep, remove, and add participants; individuals answer \
                 directly, teams run their own nested conversation.",
            ),
            Section::new("Goal").text(chat.goal().unwrap_or("No explicit goal.").to_string()),
            Section::new("Current Participants").text({
                let summary = chat.roster_summary().await;
                if summary.is_empty() {
                    "None yet.".to_string()
                } else {
                    summary
                }
            }),
        ];

        if let Some(suggestion) = &request.suggestion {
            sections.push(Section::new("Composition Suggestion").text(suggestion.clone()));
        }
        if let Some(schema) = &request.interaction_schema {
            sections.push(Section::new("Current Interaction Schema").text(schema.clone()));
        }
        if let Some(condition) = &request.termination_condition {
            sections.push(Section::new("Current Termination Condition").text(condition.clone()));
        }

        if !self.tool_catalogue.is_empty() {
            sections.push(
                Section::new("Available Tools").items(
                    self.tool_catalogue
                        .iter()
                        .map(|t| format!("{}: {}", t.name, t.description)),
                ),
            );
        }

        sections.push(
            Section::new("Output")
                .text("Answer with a single JSON object matching this schema, nothing else:")
                .child(Section::new("Schema").text(
                    serde_json::to_string_pretty(&decision_schema())
                        .unwrap_or_else(|_| String::new()),
                )),
        );

        render_sections(&sections)
    }

    async fn transcript_prompt(&self, chat: &Chat) -> Result<String, ChatError> {
        let messages = chat.messages().await?;
        if messages.is_empty() {
            return Ok("The conversation has not started yet.".to_string());
        }
        Ok(messages
            .iter()
            .map(|m| format!("{}: {}", m.sender_name, m.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn request_decision(
        &self,
        chat: &Chat,
        request: &CompositionRequest,
    ) -> Result<Decision, ChatError> {
        let mut turns = vec![
            ChatTurn::system(self.system_prompt(chat, request).await),
            ChatTurn::user(self.transcript_prompt(chat).await?),
        ];

        let mut last_err = None;
        for _ in 0..MAX_DECISION_RETRIES {
            let answer = self.completion.complete(&turns, &[]).await?;
            match self.coercer.coerce(&answer, &decision_schema()).await {
                Ok(value) => return Ok(coerce_into(value)?),
                Err(e) => {
                    debug!(error = %e, "composition decision did not parse");
                    turns.push(ChatTurn::assistant(answer));
                    turns.push(ChatTurn::user(format!(
                        "That was not valid JSON for the schema ({e}). Answer again \
                         with only the JSON object."
                    )));
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.map(ChatError::from).unwrap_or_else(|| {
            ChatError::Ledger("composition decision unavailable".to_string())
        }))
    }

    async fn summon(&self, chat: &Chat, new: NewParticipant) -> RosterMember {
        match new {
            NewParticipant::Individual {
                name,
                role,
                mission,
                symbol,
                tools,
            } => {
                let mut participant = ModelParticipant::new(name, self.completion.clone())
                    .with_role(role)
                    .with_mission(mission);
                if let Some(symbol) = symbol {
                    participant = participant.with_symbol(symbol);
                }
                for tool in resolve_tools(&self.tool_catalogue, &tools) {
                    participant = participant.with_tool(tool);
                }
                RosterMember::active(participant)
            }
            NewParticipant::Team {
                name,
                mission,
                symbol,
                composition_suggestion,
            } => {
                let inner_name = match chat.name() {
                    Some(outer) => format!("{outer} > {name}"),
                    None => name.clone(),
                };
                let inner_chat =
                    Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(NullRenderer))
                        .with_name(inner_name)
                        .with_goal(mission.clone());

                let mut conductor = ModelConductor::new(self.completion.clone())
                    .with_composition_generator(Arc::new(self.clone()));
                if let Some(suggestion) = composition_suggestion {
                    conductor = conductor.with_composition_suggestion(suggestion);
                }

                let mut group =
                    GroupParticipant::new(name, inner_chat, Box::new(conductor)).await;
                group = group.with_mission(mission);
                if let Some(symbol) = symbol {
                    group = group.with_symbol(symbol);
                }
                RosterMember::active(group)
            }
        }
    }
}

#[async_trait]
impl CompositionGenerator for ModelCompositionGenerator {
    async fn generate(
        &self,
        chat: &Chat,
        request: CompositionRequest,
    ) -> Result<Composition, ChatError> {
        let decision = self.request_decision(chat, &request).await?;

        let mut roster: Vec<RosterMember> = chat
            .members()
            .await
            .into_iter()
            .filter(|m| {
                // Removal names only apply to active participants.
                !(m.is_active()
                    && decision.participants_to_remove.iter().any(|r| r == m.name()))
            })
            .collect();

        for new in decision.participants_to_add {
            let member = self.summon(chat, new).await;
            // A duplicate summon of a kept participant is ignored.
            if roster.iter().any(|m| m.name() == member.name()) {
                continue;
            }
            roster.push(member);
        }

        info!(
            participants = roster.len(),
            removed = decision.participants_to_remove.len(),
            "composition decided"
        );

        Ok(Composition {
            roster,
            interaction_schema: decision
                .updated_interaction_schema
                .or(request.interaction_schema),
            termination_condition: decision
                .updated_termination_condition
                .or(request.termination_condition),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::participant::Participant;
    use troupe_core::test_utils::{
        RecordingParticipant, ScriptedCompletion, SilentRenderer, StaticParticipant,
    };

    async fn chat_with(names: &[&str]) -> Chat {
        let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer));
        for name in names {
            chat.add_participant(RosterMember::active(StaticParticipant::new(*name, "ok")))
                .await
                .unwrap();
        }
        chat
    }

    fn names(composition: &Composition) -> Vec<String> {
        composition
            .roster
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn applies_removals_and_additions() {
        let decision = r#"{
            "participants_to_remove": ["Alice"],
            "participants_to_add": [
                {"type": "individual", "name": "Carol", "role": "Critic", "mission": "Review."}
            ],
            "updated_interaction_schema": "Carol reviews every answer."
        }"#;
        let generator =
            ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([decision])));

        let chat = chat_with(&["Alice", "Bob"]).await;
        let composition = generator
            .generate(&chat, CompositionRequest::default())
            .await
            .unwrap();

        assert_eq!(names(&composition), ["Bob", "Carol"]);
        assert_eq!(
            composition.interaction_schema.as_deref(),
            Some("Carol reviews every answer.")
        );
    }

    #[tokio::test]
    async fn duplicate_additions_are_skipped() {
        let decision = r#"{
            "participants_to_add": [
                {"type": "individual", "name": "Bob", "role": "Echo", "mission": "Repeat."}
            ]
        }"#;
        let generator =
            ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([decision])));

        let chat = chat_with(&["Alice", "Bob"]).await;
        let composition = generator
            .generate(&chat, CompositionRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&composition), ["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn passive_members_are_never_removed() {
        let decision = r#"{
            "participants_to_remove": ["Observer"]
        }"#;
        let generator =
            ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([decision])));

        let chat = chat_with(&["Alice"]).await;
        chat.add_participant(RosterMember::passive(RecordingParticipant::new("Observer")))
            .await
            .unwrap();
        let composition = generator
            .generate(&chat, CompositionRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&composition), ["Alice", "Observer"]);
    }

    #[tokio::test]
    async fn teams_become_group_participants() {
        let decision = r#"{
            "participants_to_add": [
                {"type": "team", "name": "Research", "mission": "Dig deep."}
            ]
        }"#;
        let generator =
            ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([decision])));

        let chat = chat_with(&[]).await;
        let composition = generator
            .generate(&chat, CompositionRequest::default())
            .await
            .unwrap();

        assert_eq!(names(&composition), ["Research"]);
        let team = composition.roster[0].as_active().unwrap();
        assert!(team.detailed(0).contains("Role: Team"));
    }

    #[tokio::test]
    async fn malformed_decision_gets_a_retry() {
        let generator = ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([
            "not json at all",
            r#"{"participants_to_add": []}"#,
        ])));

        let chat = chat_with(&["Alice"]).await;
        let composition = generator
            .generate(&chat, CompositionRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&composition), ["Alice"]);
    }

    #[tokio::test]
    async fn steering_text_falls_back_to_the_request() {
        let decision = r#"{"participants_to_add": []}"#;
        let generator =
            ModelCompositionGenerator::new(Arc::new(ScriptedCompletion::new([decision])));

        let chat = chat_with(&["Alice"]).await;
        let request = CompositionRequest {
            suggestion: None,
            interaction_schema: Some("take turns".to_string()),
            termination_condition: Some("stop at consensus".to_string()),
        };
        let composition = generator.generate(&chat, request).await.unwrap();
        assert_eq!(composition.interaction_schema.as_deref(), Some("take turns"));
        assert_eq!(
            composition.termination_condition.as_deref(),
            Some("stop at consensus")
        );
    }

    #[test]
    fn unknown_tools_are_dropped() {
        let catalogue = vec![ToolDefinition::new("search", "Web search")];
        let resolved = resolve_tools(
            &catalogue,
            &["search".to_string(), "teleport".to_string()],
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "search");
    }
}
