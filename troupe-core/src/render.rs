//! The Renderer seam — a side-effect-only sink for message events.

use crate::chat::Chat;
use crate::message::Message;
use async_trait::async_trait;

/// Sink receiving every appended message not suppressed by the chat's hide
/// flags. Renderers observe; they have no control over the conversation's
/// flow and cannot fail it.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Called once per visible appended message.
    async fn render(&self, chat: &Chat, message: &Message);
}
