//! Scripted implementations of the protocol traits for tests and examples.
//!
//! Enable with the `test-utils` feature. Nothing here talks to the network.

use crate::chat::Chat;
use crate::completion::{ChatTurn, Completion, CompletionError, ToolDefinition};
use crate::error::ChatError;
use crate::message::Message;
use crate::participant::{ActiveParticipant, Participant};
use crate::render::Renderer;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Completion service that replays a fixed script of replies.
///
/// Each `complete` call pops the next reply; an exhausted script returns
/// [`CompletionError::InvalidResponse`], which makes over-consumption
/// visible in tests instead of hanging them.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    /// Create a scripted completion from replies in playback order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    /// How many scripted replies remain unconsumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().expect("script lock poisoned").len()
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn complete(
        &self,
        _turns: &[ChatTurn],
        _tools: &[ToolDefinition],
    ) -> Result<String, CompletionError> {
        self.replies
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .ok_or_else(|| CompletionError::InvalidResponse("script exhausted".into()))
    }
}

/// Active participant that always responds with the same text.
pub struct StaticParticipant {
    name: String,
    reply: String,
    hidden: bool,
}

impl StaticParticipant {
    /// Create a participant that always replies with `reply`.
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
            hidden: false,
        }
    }

    /// Hide this participant's messages from rendering.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

impl Participant for StaticParticipant {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ActiveParticipant for StaticParticipant {
    async fn respond(&self, _chat: &Chat) -> Result<String, ChatError> {
        Ok(self.reply.clone())
    }

    fn messages_hidden(&self) -> bool {
        self.hidden
    }
}

/// Passive participant that records every lifecycle event it observes.
pub struct RecordingParticipant {
    name: String,
    events: Mutex<Vec<String>>,
}

impl RecordingParticipant {
    /// Create a recording participant.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The events observed so far, in order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock poisoned").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock poisoned").push(event);
    }
}

#[async_trait]
impl Participant for RecordingParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_chat_started(&self, _chat: &Chat) {
        self.record("chat_started".into());
    }

    async fn on_chat_ended(&self, _chat: &Chat) {
        self.record("chat_ended".into());
    }

    async fn on_new_message(&self, _chat: &Chat, message: &Message) {
        self.record(format!("message:{}:{}", message.id, message.sender_name));
    }

    async fn on_participant_joined(&self, _chat: &Chat, name: &str) {
        self.record(format!("joined:{name}"));
    }

    async fn on_participant_left(&self, _chat: &Chat, name: &str) {
        self.record(format!("left:{name}"));
    }
}

/// Renderer that drops everything.
pub struct SilentRenderer;

#[async_trait]
impl Renderer for SilentRenderer {
    async fn render(&self, _chat: &Chat, _message: &Message) {}
}
