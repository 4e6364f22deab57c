//! End-to-end composition tests: model-decided rosters, nested teams.
//!
//! One scripted completion service plays every model role in order, so
//! these tests pin down the exact call sequence of a composed dialog.

use std::sync::Arc;
use troupe_composition::ModelCompositionGenerator;
use troupe_conductors::ModelConductor;
use troupe_core::chat::Chat;
use troupe_core::compose::CompositionGenerator;
use troupe_core::conduct::{Conductor, Opening};
use troupe_core::participant::RosterMember;
use troupe_core::test_utils::{ScriptedCompletion, SilentRenderer, StaticParticipant};
use troupe_ledger_memory::InMemoryLedger;
use troupe_participants::request_response;

fn memory_chat() -> Chat {
    Chat::new(Arc::new(InMemoryLedger::new()), Arc::new(SilentRenderer))
}

#[tokio::test]
async fn composition_reshapes_the_roster_before_the_dialog() {
    // Decision: drop Bob, summon Carol, adopt a new interaction schema.
    let decision = r#"{
        "participants_to_remove": ["Bob"],
        "participants_to_add": [
            {"type": "individual", "name": "Carol", "role": "Critic", "mission": "Review."}
        ],
        "updated_interaction_schema": "Carol critiques every answer."
    }"#;
    let completion = Arc::new(ScriptedCompletion::new([
        decision,
        "Carol",
        "looks good to me",
        "TERMINATE",
    ]));

    let chat = memory_chat().with_goal("review the plan");
    chat.add_participant(RosterMember::active(StaticParticipant::new("Alice", "hm")))
        .await
        .unwrap();
    chat.add_participant(RosterMember::active(StaticParticipant::new("Bob", "hm")))
        .await
        .unwrap();

    let generator = ModelCompositionGenerator::new(completion.clone());
    let mut conductor =
        ModelConductor::new(completion).with_composition_generator(Arc::new(generator));

    let result = conductor
        .run_dialog(&chat, Some(Opening::new("Here is the plan.").from_sender("Alice")))
        .await
        .unwrap();

    assert_eq!(result, "looks good to me");
    assert!(chat.has_active("Alice").await);
    assert!(!chat.has_active("Bob").await);
    assert!(chat.has_active("Carol").await);

    let senders: Vec<_> = chat
        .messages()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.sender_name)
        .collect();
    assert_eq!(senders, ["Alice", "Carol"]);
}

#[tokio::test]
async fn composed_team_runs_a_nested_dialog() {
    // Outer decision summons a team; the team's own first prepare summons
    // two individuals and runs its nested dialog to completion.
    let outer_decision = r#"{
        "participants_to_add": [
            {"type": "team", "name": "Research", "mission": "Reach a verdict."}
        ]
    }"#;
    let inner_decision = r#"{
        "participants_to_add": [
            {"type": "individual", "name": "Analyst", "role": "Analyst", "mission": "Analyze."},
            {"type": "individual", "name": "Critic", "role": "Critic", "mission": "Challenge."}
        ]
    }"#;
    let completion = Arc::new(ScriptedCompletion::new([
        outer_decision,
        "Research",           // outer speaker selection
        inner_decision,
        "Critic",             // inner speaker selection
        "data says yes",      // Critic's answer
        "TERMINATE",          // inner selection ends the nested dialog
        "the verdict is yes", // the leader relays the outcome outward
        "TERMINATE",          // outer selection ends the dialog
    ]));

    let chat = memory_chat()
        .with_name("verdict")
        .with_goal("decide yes or no");
    chat.add_participant(RosterMember::active(StaticParticipant::new(
        "Asker",
        "so, what is it?",
    )))
    .await
    .unwrap();

    let generator = ModelCompositionGenerator::new(completion.clone());
    let mut conductor =
        ModelConductor::new(completion.clone()).with_composition_generator(Arc::new(generator));

    let result = conductor
        .run_dialog(&chat, Some(Opening::new("We need a verdict.").from_sender("Asker")))
        .await
        .unwrap();

    assert_eq!(result, "the verdict is yes");
    assert!(chat.has_active("Research").await);
    assert_eq!(completion.remaining(), 0);

    let messages = chat.messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender_name, "Research");
    assert_eq!(messages[1].content, "the verdict is yes");
}

#[tokio::test]
async fn request_response_reaches_a_composed_individual() {
    let decision = r#"{
        "participants_to_add": [
            {"type": "individual", "name": "Oracle", "role": "Oracle", "mission": "Answer."}
        ]
    }"#;
    let completion = Arc::new(ScriptedCompletion::new([decision, "the answer is yes"]));
    let generator = ModelCompositionGenerator::new(completion.clone());

    // Compose against an empty chat, then pose a one-shot query to the
    // summoned individual; its answer comes from the same scripted service.
    let staging = memory_chat();
    let composition = generator
        .generate(&staging, Default::default())
        .await
        .unwrap();
    let oracle = composition.roster.into_iter().next().unwrap();
    assert_eq!(oracle.name(), "Oracle");

    let answer = request_response("will it work?", oracle).await.unwrap();
    assert_eq!(answer, "the answer is yes");
    assert_eq!(completion.remaining(), 0);
}

#[tokio::test]
async fn request_response_round_trip() {
    let answer = request_response(
        "what is 2+2?",
        RosterMember::active(StaticParticipant::new("Solver", "4 TERMINATE")),
    )
    .await
    .unwrap();
    assert_eq!(answer, "4");
}
