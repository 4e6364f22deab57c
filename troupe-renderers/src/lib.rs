#![deny(missing_docs)]
//! Message renderers.
//!
//! Renderers are side-effect-only sinks: the conversation engine hands
//! them each visible message exactly once, in order. [`TerminalRenderer`]
//! prints to stdout; [`NullRenderer`] drops everything (useful for nested
//! conversations whose output is relayed by their group participant).

use async_trait::async_trait;
use troupe_core::chat::Chat;
use troupe_core::message::Message;
use troupe_core::render::Renderer;

const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Symbol shown for senders that are no longer in the roster.
const UNKNOWN_SENDER_SYMBOL: &str = "❓";

/// Prints each message as one stdout line.
///
/// Line shape: `[timestamp] chat-name > symbol sender: content`, with the
/// timestamp and chat-name parts optional. The sender's symbol comes from
/// its [`ActiveParticipant::display`]; a sender that has since left the
/// roster is shown with a question mark.
///
/// [`ActiveParticipant::display`]: troupe_core::ActiveParticipant::display
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    include_timestamps: bool,
}

impl TerminalRenderer {
    /// Create a renderer without timestamps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix each line with the message timestamp.
    pub fn with_timestamps(mut self) -> Self {
        self.include_timestamps = true;
        self
    }

    /// The line that would be printed for this message.
    pub async fn render_to_string(&self, chat: &Chat, message: &Message) -> String {
        let sender = match chat.active_by_name(&message.sender_name).await {
            Some(sender) => sender.display(),
            None => format!("{} {}", UNKNOWN_SENDER_SYMBOL, message.sender_name),
        };

        let mut line = String::new();
        if self.include_timestamps {
            line.push_str(&format!(
                "[{}] ",
                message.timestamp.format(TIMESTAMP_FORMAT)
            ));
        }
        if let Some(name) = chat.name() {
            line.push_str(name);
            line.push_str(" > ");
        }
        line.push_str(&format!("{}: {}", sender, message.content));
        line
    }
}

#[async_trait]
impl Renderer for TerminalRenderer {
    async fn render(&self, chat: &Chat, message: &Message) {
        println!("{}", self.render_to_string(chat, message).await);
    }
}

/// Renderer that drops every message.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl NullRenderer {
    /// Create a null renderer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for NullRenderer {
    async fn render(&self, _chat: &Chat, _message: &Message) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use troupe_core::message::Message;
    use troupe_core::participant::RosterMember;
    use troupe_core::test_utils::StaticParticipant;
    use troupe_ledger_memory::InMemoryLedger;

    async fn chat() -> Chat {
        let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(NullRenderer));
        chat.add_participant(RosterMember::active(StaticParticipant::new("Alice", "ok")))
            .await
            .unwrap();
        chat
    }

    #[tokio::test]
    async fn renders_sender_display_and_content() {
        let chat = chat().await;
        let message = Message::new(1, "Alice", "hi there");
        let line = TerminalRenderer::new().render_to_string(&chat, &message).await;
        assert_eq!(line, "👤 Alice: hi there");
    }

    #[tokio::test]
    async fn chat_name_is_prefixed() {
        let chat = chat().await.with_name("planning");
        let message = Message::new(1, "Alice", "hi");
        let line = TerminalRenderer::new().render_to_string(&chat, &message).await;
        assert_eq!(line, "planning > 👤 Alice: hi");
    }

    #[tokio::test]
    async fn departed_sender_gets_question_mark() {
        let chat = chat().await;
        let message = Message::new(1, "Ghost", "who said that");
        let line = TerminalRenderer::new().render_to_string(&chat, &message).await;
        assert_eq!(line, "❓ Ghost: who said that");
    }

    #[tokio::test]
    async fn timestamps_are_prefixed_when_enabled() {
        let chat = chat().await;
        let message = Message::new(1, "Alice", "hi");
        let line = TerminalRenderer::new()
            .with_timestamps()
            .render_to_string(&chat, &message)
            .await;
        assert!(line.starts_with('['));
        assert!(line.ends_with("👤 Alice: hi"));
    }
}
