//! One-shot query helper.

use async_trait::async_trait;
use std::num::NonZeroUsize;
use std::sync::Arc;
use troupe_conductors::RoundRobinConductor;
use troupe_core::chat::Chat;
use troupe_core::conduct::{Conductor, Opening, USER_PARTICIPANT_NAME};
use troupe_core::error::ChatError;
use troupe_core::participant::{ActiveParticipant, Participant, RosterMember};
use troupe_ledger_memory::InMemoryLedger;
use troupe_renderers::NullRenderer;

// Holds the query's seat; never actually asked to speak because the
// two-message cap is reached right after the answer.
struct Requester {
    query: String,
}

impl Participant for Requester {
    fn name(&self) -> &str {
        USER_PARTICIPANT_NAME
    }
}

#[async_trait]
impl ActiveParticipant for Requester {
    async fn respond(&self, _chat: &Chat) -> Result<String, ChatError> {
        Ok(self.query.clone())
    }
}

/// Pose one query to an active participant and return its answer.
///
/// Runs a throwaway unrendered chat capped at two messages: the query,
/// attributed to `"User"`, then the answerer's single response. Works
/// with any [`ActiveParticipant`], including a whole
/// [`GroupParticipant`](crate::GroupParticipant).
pub async fn request_response(
    query: impl Into<String>,
    answerer: RosterMember,
) -> Result<String, ChatError> {
    let cap = NonZeroUsize::new(2).expect("2 is nonzero");
    let chat = Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(NullRenderer))
        .with_max_messages(cap);

    let query = query.into();
    chat.add_participant(RosterMember::active(Requester {
        query: query.clone(),
    }))
    .await?;
    chat.add_participant(answerer).await?;

    let mut conductor = RoundRobinConductor::new();
    conductor
        .run_dialog(
            &chat,
            Some(Opening::new(query).from_sender(USER_PARTICIPANT_NAME)),
        )
        .await
}
