//! The one correctness-critical race: two sessions completing the same
//! lesson at the same time must charge exactly one coin.

use crate::{day, identity, IntegrationHarness};
use anyhow::Result;
use learnbase::events::ProgressionEventLog;
use learnbase::progression::{
    CoinBalance, CompletionOutcome, FileProgressionStore, LessonKey, ProgressionEngine,
};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_completions_debit_at_most_once() -> Result<()> {
    let harness = IntegrationHarness::new();
    let root = harness.workspace_path().to_path_buf();
    let store = Arc::new(FileProgressionStore::new(root.join("users"))?);
    let events = Arc::new(ProgressionEventLog::at(root.join("events.jsonl")));
    let engine = Arc::new(ProgressionEngine::new(store, events, None, 5));

    let user = identity("racer");
    engine.load_or_create_on(&user, day(2024, 1, 10))?;
    let key = LessonKey::new("python", "intro")?;

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        let user_id = user.user_id.clone();
        let key = key.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.complete_lesson(&user_id, &key)
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.join().expect("completion thread panicked")?);
    }
    outcomes.sort_by_key(|o| *o != CompletionOutcome::Completed);
    assert_eq!(
        outcomes,
        vec![
            CompletionOutcome::Completed,
            CompletionOutcome::AlreadyCompleted
        ],
        "exactly one attempt may win the race"
    );

    let record = engine.load_or_create_on(&user, day(2024, 1, 10))?;
    assert_eq!(record.coins, CoinBalance::Coins(4), "exactly one coin spent");
    assert_eq!(record.completed_lessons, vec!["python-intro".to_string()]);
    Ok(())
}

#[test]
fn racing_daily_resets_converge() -> Result<()> {
    let harness = IntegrationHarness::new();
    let root = harness.workspace_path().to_path_buf();
    let store = Arc::new(FileProgressionStore::new(root.join("users"))?);
    let events = Arc::new(ProgressionEventLog::at(root.join("events.jsonl")));
    let engine = Arc::new(ProgressionEngine::new(store, events, None, 5));

    let user = identity("twotabs");
    engine.load_or_create_on(&user, day(2024, 1, 9))?;

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        let barrier = barrier.clone();
        let user = user.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.load_or_create_on(&user, day(2024, 1, 10))
        }));
    }
    for handle in handles {
        let record = handle.join().expect("reset thread panicked")?;
        assert_eq!(record.last_login_date, day(2024, 1, 10));
        assert_eq!(record.coins, CoinBalance::Coins(5));
    }

    let record = engine.load_or_create_on(&user, day(2024, 1, 10))?;
    assert_eq!(
        record.streak, 2,
        "both resets compute the same target state, whichever lands last"
    );
    Ok(())
}
