//! The immutable chat message record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sender name assigned to entries that could not be attributed to a
/// participant (e.g. unparsable transcript-store content).
pub const SYSTEM_SENDER: &str = "SYSTEM";

/// Message id assigned to unparsable system content. Real ids start at 1.
pub const UNPARSED_MESSAGE_ID: i64 = -1;

/// One message in a conversation.
///
/// Messages are created and owned exclusively by the [`Ledger`]; ids are
/// assigned there, never by callers. Within one ledger, ids are unique and
/// strictly increasing for the ledger's whole lifetime, even across
/// participant removals.
///
/// [`Ledger`]: crate::ledger::Ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonically increasing id, starting at 1.
    /// [`UNPARSED_MESSAGE_ID`] marks unparsed system content.
    pub id: i64,
    /// Name of the participant this message is attributed to.
    pub sender_name: String,
    /// The message body.
    pub content: String,
    /// When the message was appended.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(id: i64, sender_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            sender_name: sender_name.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create the fallback record for content that did not match the
    /// transcript grammar: sender [`SYSTEM_SENDER`], id [`UNPARSED_MESSAGE_ID`].
    pub fn unparsed(content: impl Into<String>) -> Self {
        Self::new(UNPARSED_MESSAGE_ID, SYSTEM_SENDER, content)
    }
}
