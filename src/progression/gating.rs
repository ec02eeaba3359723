//! Lesson gating: pure derivations of per-lesson navigability from a
//! progression record and the catalog. No store access, no side effects.
//!
//! Gating is strictly sequential per language: completing lesson N unlocks
//! lesson N+1 of the same language and nothing else. Cross-language
//! progress never unlocks anything.

use super::{LessonStatus, ProgressionRecord};
use crate::catalog::Language;

fn key_for(language: &Language, lesson_index: usize) -> String {
    format!("{}-{}", language.id, language.lessons[lesson_index].id)
}

/// Status of the lesson at `lesson_index`, or `None` when the index is out
/// of range.
pub fn lesson_status(
    language: &Language,
    lesson_index: usize,
    record: &ProgressionRecord,
) -> Option<LessonStatus> {
    if lesson_index >= language.lessons.len() {
        return None;
    }
    let key = key_for(language, lesson_index);
    if record.completed_lessons.contains(&key) {
        return Some(LessonStatus::Completed);
    }
    if lesson_index == 0 {
        return Some(LessonStatus::Unlocked);
    }
    if record.is_admin {
        return Some(LessonStatus::Unlocked);
    }
    let prev_key = key_for(language, lesson_index - 1);
    if record.completed_lessons.contains(&prev_key) {
        Some(LessonStatus::Unlocked)
    } else {
        Some(LessonStatus::Locked)
    }
}

/// Redirect target for a locked lesson: the closest playable lesson before
/// `from_index`. Falls back to the first lesson.
pub fn nearest_unlocked(
    language: &Language,
    from_index: usize,
    record: &ProgressionRecord,
) -> usize {
    let upper = from_index.min(language.lessons.len());
    for index in (0..upper).rev() {
        if lesson_status(language, index, record) != Some(LessonStatus::Locked) {
            return index;
        }
    }
    0
}

/// How many of a language's lessons this user has completed.
pub fn completed_count(language: &Language, record: &ProgressionRecord) -> usize {
    (0..language.lessons.len())
        .filter(|&index| record.completed_lessons.contains(&key_for(language, index)))
        .count()
}
