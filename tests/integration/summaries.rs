use crate::IntegrationHarness;
use anyhow::Result;
use learnbase::events::{EventType, ProgressionEventLog};
use learnbase::progression::LessonKey;

#[test]
fn progress_summary_counts_per_language() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    ctx.sign_up("learner@example.com", "hunter2hunter2", "Learner")?;
    let user_id = ctx.record()?.user_id.clone();

    ctx.engine()
        .complete_lesson(&user_id, &LessonKey::new("python", "intro")?)?;
    ctx.engine()
        .complete_lesson(&user_id, &LessonKey::new("python", "variables")?)?;
    ctx.engine()
        .complete_lesson(&user_id, &LessonKey::new("rust", "intro")?)?;
    ctx.refresh_record()?;

    let summary = ctx.progress_summary()?;
    assert_eq!(summary.completed_total, 3);
    assert_eq!(summary.lesson_total, 9, "builtin catalog ships three lessons per language");
    let python = summary
        .languages
        .iter()
        .find(|l| l.language_id == "python")
        .expect("python progress present");
    assert_eq!((python.completed, python.total), (2, 3));
    let javascript = summary
        .languages
        .iter()
        .find(|l| l.language_id == "javascript")
        .expect("javascript progress present");
    assert_eq!(javascript.completed, 0);
    Ok(())
}

#[test]
fn recent_activity_lists_newest_first() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    ctx.sign_up("learner@example.com", "hunter2hunter2", "Learner")?;
    let user_id = ctx.record()?.user_id.clone();

    for (language, lesson) in [
        ("python", "intro"),
        ("javascript", "intro"),
        ("rust", "intro"),
    ] {
        ctx.engine()
            .complete_lesson(&user_id, &LessonKey::new(language, lesson)?)?;
    }
    ctx.refresh_record()?;

    let recent = ctx.recent_activity(2)?;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].lesson_key, "rust-intro");
    assert_eq!(recent[0].language_name.as_deref(), Some("Rust"));
    assert_eq!(recent[0].lesson_title.as_deref(), Some("Introduction to Rust"));
    assert_eq!(recent[1].lesson_key, "javascript-intro");
    Ok(())
}

#[test]
fn the_event_log_records_the_progression_lifecycle() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut ctx = harness.context();
    ctx.sign_up("learner@example.com", "hunter2hunter2", "Learner")?;
    let user_id = ctx.record()?.user_id.clone();

    ctx.engine()
        .complete_lesson(&user_id, &LessonKey::new("python", "intro")?)?;
    ctx.engine().adjust_coins(&user_id, -4)?;
    ctx.engine()
        .complete_lesson(&user_id, &LessonKey::new("python", "variables")?)?;
    ctx.sign_out()?;

    let log = ProgressionEventLog::at(harness.workspace_path().join("events.jsonl"));
    let events: Vec<EventType> = log
        .read_all()?
        .into_iter()
        .filter(|e| e.user_id == user_id)
        .map(|e| e.event_type)
        .collect();
    assert_eq!(
        events,
        vec![
            EventType::UserCreated,
            EventType::SignedIn,
            EventType::LessonCompleted,
            EventType::CoinsAdjusted,
            EventType::CompletionRejected,
            EventType::SignedOut,
        ]
    );
    Ok(())
}
