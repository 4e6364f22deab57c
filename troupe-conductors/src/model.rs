//! Model-driven speaker selection with optional roster composition.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use troupe_core::chat::Chat;
use troupe_core::completion::{ChatTurn, Completion};
use troupe_core::compose::{CompositionGenerator, CompositionRequest};
use troupe_core::conduct::{Conductor, TERMINATION_MARKER};
use troupe_core::error::ChatError;
use troupe_core::participant::ActiveParticipant;
use troupe_core::prompt::{Section, render_sections};

const DEFAULT_MAX_SELECTION_RETRIES: usize = 5;

/// Asks a completion service who should speak next.
///
/// On every turn the conductor sends the roster, the steering text, and
/// the transcript so far, and expects back either an active participant's
/// exact name or the termination marker. An answer that is neither gets a
/// bounded number of corrective follow-ups; when those run out the
/// conversation is terminated rather than looping forever.
///
/// If a [`CompositionGenerator`] is attached, the first
/// [`prepare`](Conductor::prepare) call diffs the generated roster
/// against the live one, applies the adds and removals, and adopts any
/// updated steering text. The latch makes this a once-per-conductor
/// operation, so nested conversations re-entering the same conductor do
/// not recompose.
pub struct ModelConductor {
    completion: Arc<dyn Completion>,
    composition_generator: Option<Arc<dyn CompositionGenerator>>,
    composition_suggestion: Option<String>,
    composition_applied: bool,
    interaction_schema: Option<String>,
    termination_condition: Option<String>,
    max_selection_retries: usize,
}

impl ModelConductor {
    /// Create a conductor over the given completion service.
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self {
            completion,
            composition_generator: None,
            composition_suggestion: None,
            composition_applied: false,
            interaction_schema: None,
            termination_condition: None,
            max_selection_retries: DEFAULT_MAX_SELECTION_RETRIES,
        }
    }

    /// Recompose the roster through this generator on first `prepare`.
    pub fn with_composition_generator(mut self, generator: Arc<dyn CompositionGenerator>) -> Self {
        self.composition_generator = Some(generator);
        self
    }

    /// Free-text suggestion passed to the composition generator.
    pub fn with_composition_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.composition_suggestion = Some(suggestion.into());
        self
    }

    /// Free-text rules describing how participants should interact.
    pub fn with_interaction_schema(mut self, schema: impl Into<String>) -> Self {
        self.interaction_schema = Some(schema.into());
        self
    }

    /// Free-text condition describing when the conversation should end.
    pub fn with_termination_condition(mut self, condition: impl Into<String>) -> Self {
        self.termination_condition = Some(condition.into());
        self
    }

    /// Cap on corrective re-asks per selection (default 5).
    pub fn with_max_selection_retries(mut self, retries: usize) -> Self {
        self.max_selection_retries = retries;
        self
    }

    async fn selection_system_prompt(&self, chat: &Chat) -> String {
        let mut mission = Section::new("Mission").text(
            "Select the next speaker in the conversation based on the previous messages. \
             It should be the most critical participant to move the conversation towards \
             its goal.",
        );
        if self.termination_condition.is_some() {
            mission = mission.item(
                "If the conversation should end instead of continuing, say so by \
                 answering with the termination word.",
            );
        }

        let rules = match &self.interaction_schema {
            Some(schema) => Section::new("Rules").text(schema.clone()),
            None => Section::new("Rules")
                .item("Answer with the name of one participant, exactly as listed.")
                .item("Do not select the same participant twice in a row unless necessary."),
        };

        let mut sections = vec![
            mission,
            Section::new("Goal").text(chat.goal().unwrap_or("No explicit goal.").to_string()),
            Section::new("Participants").text(chat.roster_summary().await),
            rules,
        ];

        if let Some(condition) = &self.termination_condition {
            sections.push(
                Section::new("Termination Condition")
                    .text(condition.clone())
                    .item(format!("To end the conversation, answer exactly: {TERMINATION_MARKER}")),
            );
        }

        sections.push(
            Section::new("Output")
                .text("Answer with a single participant name, nothing else.")
                .item(format!("Or the word {TERMINATION_MARKER} to end the conversation.")),
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

    async fn apply_composition(&mut self, chat: &Chat) -> Result<(), ChatError> {
        let generator = match &self.composition_generator {
            Some(generator) => generator.clone(),
            None => return Ok(()),
        };

        let request = CompositionRequest {
            suggestion: self.composition_suggestion.clone(),
            interaction_schema: self.interaction_schema.clone(),
            termination_condition: self.termination_condition.clone(),
        };
        let composition = generator.generate(chat, request).await?;

        let desired: Vec<String> = composition
            .roster
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        // Only active participants are diffed away; passive observers stay
        // regardless of what the generator returned.
        for member in chat.members().await {
            if member.is_active() && !desired.iter().any(|name| name == member.name()) {
                chat.remove_participant(member.name()).await?;
            }
        }

        for member in composition.roster {
            let name = member.name().to_string();
            if !chat.has_active(&name).await && !chat.has_passive(&name).await {
                chat.add_participant(member).await?;
            }
        }

        if composition.interaction_schema.is_some() {
            self.interaction_schema = composition.interaction_schema;
        }
        if composition.termination_condition.is_some() {
            self.termination_condition = composition.termination_condition;
        }

        info!(participants = desired.len(), "composition applied");
        Ok(())
    }
}

#[async_trait]
impl Conductor for ModelConductor {
    async fn prepare(&mut self, chat: &Chat) -> Result<(), ChatError> {
        if self.composition_applied {
            return Ok(());
        }
        self.apply_composition(chat).await?;
        self.composition_applied = true;
        Ok(())
    }

    async fn select_next_speaker(
        &mut self,
        chat: &Chat,
    ) -> Result<Option<Arc<dyn ActiveParticipant>>, ChatError> {
        let actives = chat.active_participants().await;
        if actives.len() < 2 {
            return Ok(None);
        }

        let mut turns = vec![
            ChatTurn::system(self.selection_system_prompt(chat).await),
            ChatTurn::user(self.transcript_prompt(chat).await?),
        ];

        for attempt in 0..=self.max_selection_retries {
            let answer = self.completion.complete(&turns, &[]).await?;
            let answer = answer.trim();

            if answer == TERMINATION_MARKER {
                debug!("selection terminated the conversation");
                return Ok(None);
            }

            if let Some(speaker) = chat.active_by_name(answer).await {
                debug!(speaker = answer, "next speaker selected");
                return Ok(Some(speaker));
            }

            debug!(answer, attempt, "selection did not match a participant");
            let valid: Vec<&str> = actives.iter().map(|p| p.name()).collect();
            turns.push(ChatTurn::assistant(answer));
            turns.push(ChatTurn::user(format!(
                "\"{answer}\" is not a valid answer. Answer with exactly one of: {}. \
                 Or answer {TERMINATION_MARKER} to end the conversation.",
                valid.join(", ")
            )));
        }

        warn!(
            retries = self.max_selection_retries,
            "speaker selection retries exhausted, terminating conversation"
        );
        Ok(None)
    }
}
