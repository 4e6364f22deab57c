//! Human-in-the-loop participant.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Mutex;
use troupe_core::chat::Chat;
use troupe_core::conduct::USER_PARTICIPANT_NAME;
use troupe_core::error::ChatError;
use troupe_core::participant::{ActiveParticipant, Participant};

/// Source of human input lines.
///
/// A closed source (EOF, interrupt, exhausted script) reports
/// [`ChatError::Interrupted`], which aborts the dialog unless another
/// participant can take over.
#[async_trait]
pub trait UserInput: Send + Sync {
    /// Read one line, showing `prompt` first where that makes sense.
    async fn read_line(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Reads lines from stdin on a blocking worker thread.
pub struct StdinInput;

#[async_trait]
impl UserInput for StdinInput {
    async fn read_line(&self, prompt: &str) -> Result<String, ChatError> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            write!(stdout, "{prompt}").and_then(|_| stdout.flush()).ok();

            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) => Err(ChatError::Interrupted),
                Ok(_) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
                Err(e) => Err(ChatError::Other(Box::new(e))),
            }
        })
        .await
        .map_err(|e| ChatError::Other(Box::new(e)))?
    }
}

/// Scripted input source; replays queued lines, then interrupts.
pub struct QueuedInput {
    lines: Mutex<VecDeque<String>>,
}

impl QueuedInput {
    /// Queue lines in playback order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl UserInput for QueuedInput {
    async fn read_line(&self, _prompt: &str) -> Result<String, ChatError> {
        self.lines
            .lock()
            .expect("input lock poisoned")
            .pop_front()
            .ok_or(ChatError::Interrupted)
    }
}

/// The human seat in a conversation.
///
/// Messages are hidden from rendering by default since a terminal already
/// echoes what the human typed. The default name `"User"` is also the
/// name the interrupt hand-off looks for, so a `UserParticipant` in the
/// roster doubles as the rescue seat when another speaker is interrupted.
pub struct UserParticipant {
    name: String,
    input: Box<dyn UserInput>,
    symbol: String,
    hidden: bool,
}

impl UserParticipant {
    /// Create a participant named `"User"` reading from the given source.
    pub fn new(input: impl UserInput + 'static) -> Self {
        Self {
            name: USER_PARTICIPANT_NAME.to_string(),
            input: Box::new(input),
            symbol: "👤".to_string(),
            hidden: true,
        }
    }

    /// Create a stdin-backed participant named `"User"`.
    pub fn from_stdin() -> Self {
        Self::new(StdinInput)
    }

    /// Rename the participant. A renamed user no longer receives the
    /// interrupt hand-off.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the display symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Render this participant's messages instead of hiding them.
    pub fn visible(mut self) -> Self {
        self.hidden = false;
        self
    }
}

impl Participant for UserParticipant {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ActiveParticipant for UserParticipant {
    async fn respond(&self, _chat: &Chat) -> Result<String, ChatError> {
        self.input.read_line(&format!("{}: ", self.display())).await
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn messages_hidden(&self) -> bool {
        self.hidden
    }
}
