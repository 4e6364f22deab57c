//! Terminating participant that extracts a typed result.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use tracing::debug;
use troupe_core::chat::Chat;
use troupe_core::coerce::{Coercer, JsonCoercer, coerce_into};
use troupe_core::conduct::TERMINATION_MARKER;
use troupe_core::error::ChatError;
use troupe_core::participant::{ActiveParticipant, Participant};

/// Coerces the last message into a `T` and ends the conversation.
///
/// On its turn the parser reads the most recent message and runs it
/// through its [`Coercer`] against the configured JSON schema. A
/// successful parse is captured for later retrieval and answered as the
/// canonical JSON followed by the termination marker; a failed parse is
/// answered conversationally so the previous speaker can try again.
pub struct OutputParser<T> {
    name: String,
    coercer: Arc<dyn Coercer>,
    schema: serde_json::Value,
    captured: Mutex<Option<T>>,
}

impl<T> OutputParser<T>
where
    T: DeserializeOwned + Serialize + Send + Sync,
{
    /// Create a parser named `"Output Parser"` using the JSON coercer.
    pub fn new(schema: serde_json::Value) -> Self {
        Self {
            name: "Output Parser".to_string(),
            coercer: Arc::new(JsonCoercer),
            schema,
            captured: Mutex::new(None),
        }
    }

    /// Rename the parser.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the coercer (for model-assisted repair of malformed text).
    pub fn with_coercer(mut self, coercer: Arc<dyn Coercer>) -> Self {
        self.coercer = coercer;
        self
    }

    /// Take the captured value, if a parse has succeeded.
    pub fn take_output(&self) -> Option<T> {
        self.captured.lock().expect("output lock poisoned").take()
    }
}

impl<T> Participant for OutputParser<T>
where
    T: DeserializeOwned + Serialize + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn detailed(&self, level: usize) -> String {
        let prefix = "    ".repeat(level);
        format!(
            "{prefix}Name: {}\n{prefix}Role: Structured output extractor",
            self.name
        )
    }
}

#[async_trait]
impl<T> ActiveParticipant for OutputParser<T>
where
    T: DeserializeOwned + Serialize + Send + Sync,
{
    async fn respond(&self, chat: &Chat) -> Result<String, ChatError> {
        let last = chat
            .messages()
            .await?
            .pop()
            .ok_or(ChatError::EmptyLedger)?;

        match self.coercer.coerce(&last.content, &self.schema).await {
            Ok(value) => {
                let parsed: T = coerce_into(value.clone())?;
                let rendered = serde_json::to_string(&value)
                    .map_err(|e| ChatError::Other(Box::new(e)))?;
                *self.captured.lock().expect("output lock poisoned") = Some(parsed);
                debug!(parser = %self.name, "output captured");
                Ok(format!("{rendered} {TERMINATION_MARKER}"))
            }
            Err(e) => Ok(format!(
                "I could not extract a result from that: {e}. \
                 Please answer again as JSON matching the expected schema."
            )),
        }
    }

    fn symbol(&self) -> &str {
        "📝"
    }
}
