#![deny(missing_docs)]
//! Ledger implementation proxied through an external transcript store.
//!
//! Conversational-memory backends (vector stores, summarizing memories,
//! databases) usually hold plain text entries. [`TranscriptLedger`] adapts
//! any such backend to the [`Ledger`] trait by serializing each message
//! with a documented grammar and re-deriving ids and sender names on read:
//!
//! ```text
//! entry        := timestamp? id ". " sender ": " content
//! timestamp    := "[" MM-DD-YYYY HH:MM:SS "]" " "     (optional, flag-controlled)
//! id           := decimal integer ≥ 1
//! sender       := participant name (no colon)
//! content      := rest of the entry, may span lines
//! ```
//!
//! Entries that do not match the grammar are tolerated: they come back as
//! sender `"SYSTEM"` with id `-1`, so foreign content in a shared memory
//! cannot poison the conversation.
//!
//! The roster is kept locally; only messages round-trip through the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::{Mutex, RwLock};
use troupe_core::error::ChatError;
use troupe_core::ledger::Ledger;
use troupe_core::message::Message;
use troupe_core::participant::{ActiveParticipant, Participant, Roster, RosterMember};

/// Display format for the optional timestamp prefix.
const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(?:\[[^\]]*\]\s*)?(\d+)\.\s*(.+?):\s*(.*)$")
        .expect("transcript entry regex is valid")
});

/// External conversational-memory object holding one entry per message.
///
/// Implementations wrap whatever storage they like; failures surface as
/// [`ChatError::Ledger`].
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// All stored entries, oldest first.
    async fn entries(&self) -> Result<Vec<String>, ChatError>;

    /// Append one entry.
    async fn record(&self, entry: &str) -> Result<(), ChatError>;

    /// Remove all entries.
    async fn clear(&self) -> Result<(), ChatError>;
}

/// Reference [`TranscriptStore`] backed by an in-process `Vec`.
pub struct InMemoryTranscript {
    entries: RwLock<Vec<String>>,
}

impl InMemoryTranscript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create a transcript pre-seeded with entries (oldest first).
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: RwLock::new(entries.into_iter().map(Into::into).collect()),
        }
    }
}

impl Default for InMemoryTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn entries(&self) -> Result<Vec<String>, ChatError> {
        Ok(self.entries.read().await.clone())
    }

    async fn record(&self, entry: &str) -> Result<(), ChatError> {
        self.entries.write().await.push(entry.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ChatError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Parse one stored entry back into a [`Message`].
///
/// Unparsable entries map to the `SYSTEM`/`-1` fallback instead of
/// erroring.
pub fn parse_entry(entry: &str) -> Message {
    match ENTRY_RE.captures(entry) {
        Some(caps) => {
            let id = caps[1].parse().unwrap_or(troupe_core::UNPARSED_MESSAGE_ID);
            Message::new(id, &caps[2], &caps[3])
        }
        None => Message::unparsed(entry),
    }
}

/// [`Ledger`] that proxies messages through a [`TranscriptStore`].
///
/// The id counter seeds itself lazily from the highest parsed id already in
/// the store, so ids stay strictly increasing over pre-existing content.
pub struct TranscriptLedger<S: TranscriptStore> {
    store: S,
    roster: RwLock<Roster>,
    // None until the first append (or after clear); then Some(highest id).
    last_id: Mutex<Option<i64>>,
    include_timestamps: bool,
}

impl<S: TranscriptStore> TranscriptLedger<S> {
    /// Create a ledger over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            roster: RwLock::new(Roster::new()),
            last_id: Mutex::new(None),
            include_timestamps: false,
        }
    }

    /// Prefix each stored entry with the message timestamp.
    pub fn with_timestamps(mut self) -> Self {
        self.include_timestamps = true;
        self
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn format_entry(&self, message: &Message) -> String {
        let body = format!(
            "{}. {}: {}",
            message.id, message.sender_name, message.content
        );
        if self.include_timestamps {
            format!("[{}] {}", message.timestamp.format(TIMESTAMP_FORMAT), body)
        } else {
            body
        }
    }

    async fn seed_last_id(&self) -> Result<i64, ChatError> {
        let highest = self
            .store
            .entries()
            .await?
            .iter()
            .map(|entry| parse_entry(entry).id)
            .max()
            .unwrap_or(0);
        Ok(highest.max(0))
    }
}

#[async_trait]
impl<S: TranscriptStore> Ledger for TranscriptLedger<S> {
    async fn messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self
            .store
            .entries()
            .await?
            .iter()
            .map(|entry| parse_entry(entry))
            .collect())
    }

    async fn append(
        &self,
        sender_name: &str,
        content: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Message, ChatError> {
        let mut last_id = self.last_id.lock().await;
        let current = match *last_id {
            Some(id) => id,
            None => self.seed_last_id().await?,
        };

        let mut message = Message::new(current + 1, sender_name, content);
        if let Some(timestamp) = timestamp {
            message.timestamp = timestamp;
        }

        self.store.record(&self.format_entry(&message)).await?;
        *last_id = Some(message.id);

        Ok(message)
    }

    async fn clear(&self) -> Result<(), ChatError> {
        let mut last_id = self.last_id.lock().await;
        self.store.clear().await?;
        *last_id = Some(0);
        Ok(())
    }

    async fn add_member(&self, member: RosterMember) -> Result<(), ChatError> {
        self.roster.write().await.add(member)
    }

    async fn remove_member(&self, name: &str) -> Result<RosterMember, ChatError> {
        self.roster.write().await.remove(name)
    }

    async fn members(&self) -> Vec<RosterMember> {
        self.roster.read().await.members()
    }

    async fn active_participants(&self) -> Vec<Arc<dyn ActiveParticipant>> {
        self.roster.read().await.actives()
    }

    async fn passive_participants(&self) -> Vec<Arc<dyn Participant>> {
        self.roster.read().await.passives()
    }

    async fn active_by_name(&self, name: &str) -> Option<Arc<dyn ActiveParticipant>> {
        self.roster.read().await.active_by_name(name)
    }

    async fn passive_by_name(&self, name: &str) -> Option<Arc<dyn Participant>> {
        self.roster.read().await.passive_by_name(name)
    }

    async fn has_active(&self, name: &str) -> bool {
        self.roster.read().await.has_active(name)
    }

    async fn has_passive(&self, name: &str) -> bool {
        self.roster.read().await.has_passive(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::{SYSTEM_SENDER, UNPARSED_MESSAGE_ID};

    #[test]
    fn parses_well_formed_entries() {
        let msg = parse_entry("3. Bob: multi\nline content");
        assert_eq!(msg.id, 3);
        assert_eq!(msg.sender_name, "Bob");
        assert_eq!(msg.content, "multi\nline content");
    }

    #[test]
    fn parses_timestamp_prefixed_entries() {
        let msg = parse_entry("[01-02-2024 10:30:00] 7. Alice: hello");
        assert_eq!(msg.id, 7);
        assert_eq!(msg.sender_name, "Alice");
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn malformed_entries_fall_back_to_system() {
        let msg = parse_entry("a summary the memory wrote on its own");
        assert_eq!(msg.id, UNPARSED_MESSAGE_ID);
        assert_eq!(msg.sender_name, SYSTEM_SENDER);
        assert_eq!(msg.content, "a summary the memory wrote on its own");
    }

    #[tokio::test]
    async fn round_trips_through_the_store() {
        let ledger = TranscriptLedger::new(InMemoryTranscript::new());
        ledger.append("Alice", "hi", None).await.unwrap();
        ledger.append("Bob", "hello", None).await.unwrap();

        let messages = ledger.messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[0].sender_name, "Alice");
        assert_eq!(messages[1].id, 2);
        assert_eq!(messages[1].content, "hello");
    }

    #[tokio::test]
    async fn ids_continue_after_preexisting_entries() {
        let store = InMemoryTranscript::with_entries(["1. Alice: old", "2. Bob: older"]);
        let ledger = TranscriptLedger::new(store);
        let msg = ledger.append("Alice", "new", None).await.unwrap();
        assert_eq!(msg.id, 3);
    }

    #[tokio::test]
    async fn clear_resets_ids() {
        let ledger = TranscriptLedger::new(InMemoryTranscript::new());
        ledger.append("Alice", "hi", None).await.unwrap();
        ledger.clear().await.unwrap();
        assert!(ledger.messages().await.unwrap().is_empty());
        let msg = ledger.append("Alice", "again", None).await.unwrap();
        assert_eq!(msg.id, 1);
    }

    #[tokio::test]
    async fn timestamp_prefix_round_trips() {
        let ledger = TranscriptLedger::new(InMemoryTranscript::new()).with_timestamps();
        ledger.append("Alice", "hi", None).await.unwrap();

        let entries = ledger.store().entries().await.unwrap();
        assert!(entries[0].starts_with('['));

        let messages = ledger.messages().await.unwrap();
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[0].sender_name, "Alice");
        assert_eq!(messages[0].content, "hi");
    }
}
