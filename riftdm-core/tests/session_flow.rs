//! Integration tests for the full narrative request pipeline.
//!
//! These run entirely offline against scripted narration and an in-memory
//! quest log. Live-API coverage lives in `qa_live_narration.rs`.

use riftdm_core::testing::{assert_last_quest_id, assert_quest_count, TestSession};
use riftdm_core::{Character, PlayerId, QuestLog, QuestRecord, SessionConfig, SessionError};

#[tokio::test]
async fn test_full_exchange_is_logged_and_numbered() {
    let session = TestSession::new();
    session.expect_narrative("You find a dusty ledger and nothing else.");

    let player = PlayerId::new("rhea");
    session
        .engine
        .create_character(player.clone(), "Elira", "elf", "rogue", None)
        .await;

    let response = session
        .engine
        .handle_narrative_request(&player, "I search the room")
        .await
        .unwrap();

    assert_eq!(response.quest_id, 1);
    assert_eq!(response.narrative, "You find a dusty ledger and nothing else.");
    assert!(!response.roll.is_degraded());

    assert_quest_count(&session.log, 1);
    assert_last_quest_id(&session.log, 1);

    let record = QuestRecord::parse(&session.log.entries()[0]).unwrap();
    assert_eq!(
        record.prompt,
        format!("I search the room (Roll: {})", response.roll.total)
    );
    assert_eq!(record.reply, "You find a dusty ledger and nothing else.");

    // The narrator saw the descriptor, the prompt, and the roll.
    let requests = session.narrator.requests();
    assert_eq!(
        requests[0].action,
        format!(
            "You are Elira, a elf rogue. I search the room (Roll: {})",
            response.roll.total
        )
    );
    assert!(requests[0].transcript.is_empty());
}

#[tokio::test]
async fn test_quest_numbering_continues_across_requests() {
    let session = TestSession::new();
    session
        .expect_narrative("The door creaks open.")
        .expect_narrative("Stairs descend into the dark.");

    let player = PlayerId::new("rhea");

    let first = session
        .engine
        .handle_narrative_request(&player, "I open the door")
        .await
        .unwrap();
    let second = session
        .engine
        .handle_narrative_request(&player, "I look inside")
        .await
        .unwrap();

    assert_eq!(first.quest_id, 1);
    assert_eq!(second.quest_id, 2);
    assert_quest_count(&session.log, 2);
    assert_last_quest_id(&session.log, 2);

    // The second request replayed the first exchange.
    let requests = session.narrator.requests();
    assert_eq!(requests[1].transcript.len(), 2);
    assert!(requests[1].transcript[0]
        .text
        .starts_with("I open the door (Roll: "));
    assert_eq!(requests[1].transcript[1].text, "The door creaks open.");
}

#[tokio::test]
async fn test_failed_generation_leaves_history_untouched() {
    let session = TestSession::new();
    session.expect_failure("connection reset");
    let player = PlayerId::new("rhea");

    let result = session.engine.handle_narrative_request(&player, "I yell").await;

    assert!(matches!(result, Err(SessionError::Generation(_))));
    assert_quest_count(&session.log, 0);

    // The next successful exchange claims the id the failed one would have.
    session.expect_narrative("Your voice echoes down the hall.");
    let response = session
        .engine
        .handle_narrative_request(&player, "I yell again")
        .await
        .unwrap();
    assert_eq!(response.quest_id, 1);
}

#[tokio::test]
async fn test_malformed_history_is_skipped_not_fatal() {
    let session = TestSession::new();
    session
        .log
        .append("Quest ID: #enoch\nPrompt:** ???\n**DM Reply:** garbled")
        .await
        .unwrap();
    session
        .log
        .append(
            &QuestRecord::new(2, "May 04, 2025 – 11:00 AM", "I pray", 5, "A calm settles.")
                .to_log_string(),
        )
        .await
        .unwrap();
    session.expect_narrative("The calm deepens.");

    let player = PlayerId::new("rhea");
    let response = session
        .engine
        .handle_narrative_request(&player, "I keep praying")
        .await
        .unwrap();

    assert_eq!(response.quest_id, 3);
    let requests = session.narrator.requests();
    assert_eq!(requests[0].transcript.len(), 2);
    assert_eq!(requests[0].transcript[0].text, "I pray (Roll: 5)");
}

#[tokio::test]
async fn test_memory_window_takes_most_recent_entries() {
    let config = SessionConfig::new().with_memory_window(2);
    let session = TestSession::with_config(config);
    for id in 1..=3u64 {
        session
            .log
            .append(
                &QuestRecord::new(
                    id,
                    "May 04, 2025 – 11:00 AM",
                    &format!("step {id}"),
                    4,
                    format!("reply {id}"),
                )
                .to_log_string(),
            )
            .await
            .unwrap();
    }
    session.expect_narrative("Onward.");

    let player = PlayerId::new("rhea");
    let response = session
        .engine
        .handle_narrative_request(&player, "I continue")
        .await
        .unwrap();

    // The window drops the oldest exchange but numbering still advances.
    assert_eq!(response.quest_id, 4);
    let requests = session.narrator.requests();
    assert_eq!(requests[0].transcript.len(), 4);
    assert_eq!(requests[0].transcript[0].text, "step 2 (Roll: 4)");
}

#[tokio::test]
async fn test_passive_bonus_flows_into_logged_roll() {
    // 1d1 always rolls 1, so totals are deterministic.
    let config = SessionConfig::new().with_action_formula("1d1");
    let session = TestSession::with_config(config);
    session.expect_narrative("Coins vanish up your sleeve.");

    let player = PlayerId::new("rhea");
    let character = Character::new("Fen", "halfling", "thief").with_passive("Ambidextrous");
    session.engine.insert_character(player.clone(), character).await;

    let response = session
        .engine
        .handle_narrative_request(&player, "I juggle with both hands")
        .await
        .unwrap();

    assert_eq!(response.roll.total, 3);
    let record = QuestRecord::parse(&session.log.entries()[0]).unwrap();
    assert_eq!(record.prompt, "I juggle with both hands (Roll: 3)");
}
