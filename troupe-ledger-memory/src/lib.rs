#![deny(missing_docs)]
//! In-memory implementation of troupe-core's Ledger trait.
//!
//! Messages live in a `Vec` and the roster in a [`Roster`], both behind a
//! `RwLock`. Suitable for testing, nested group chats, and any
//! conversation that does not need to survive the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use troupe_core::error::ChatError;
use troupe_core::ledger::Ledger;
use troupe_core::message::Message;
use troupe_core::participant::{ActiveParticipant, Participant, Roster, RosterMember};

struct State {
    messages: Vec<Message>,
    roster: Roster,
    last_id: i64,
}

/// In-memory message store + roster behind a `RwLock`.
///
/// Ids are assigned `1, 2, 3, …` in append order and reset on `clear`.
pub struct InMemoryLedger {
    state: RwLock<State>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                messages: Vec::new(),
                roster: Roster::new(),
                last_id: 0,
            }),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn messages(&self) -> Result<Vec<Message>, ChatError> {
        Ok(self.state.read().await.messages.clone())
    }

    async fn append(
        &self,
        sender_name: &str,
        content: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Message, ChatError> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let mut message = Message::new(state.last_id, sender_name, content);
        if let Some(timestamp) = timestamp {
            message.timestamp = timestamp;
        }

        state.messages.push(message.clone());
        Ok(message)
    }

    async fn clear(&self) -> Result<(), ChatError> {
        let mut state = self.state.write().await;
        state.messages.clear();
        state.last_id = 0;
        Ok(())
    }

    async fn add_member(&self, member: RosterMember) -> Result<(), ChatError> {
        self.state.write().await.roster.add(member)
    }

    async fn remove_member(&self, name: &str) -> Result<RosterMember, ChatError> {
        self.state.write().await.roster.remove(name)
    }

    async fn members(&self) -> Vec<RosterMember> {
        self.state.read().await.roster.members()
    }

    async fn active_participants(&self) -> Vec<Arc<dyn ActiveParticipant>> {
        self.state.read().await.roster.actives()
    }

    async fn passive_participants(&self) -> Vec<Arc<dyn Participant>> {
        self.state.read().await.roster.passives()
    }

    async fn active_by_name(&self, name: &str) -> Option<Arc<dyn ActiveParticipant>> {
        self.state.read().await.roster.active_by_name(name)
    }

    async fn passive_by_name(&self, name: &str) -> Option<Arc<dyn Participant>> {
        self.state.read().await.roster.passive_by_name(name)
    }

    async fn has_active(&self, name: &str) -> bool {
        self.state.read().await.roster.has_active(name)
    }

    async fn has_passive(&self, name: &str) -> bool {
        self.state.read().await.roster.has_passive(name)
    }
}
