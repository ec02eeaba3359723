//! Derived progress views: overall counts, per-language progress, and the
//! recent-activity feed. Read-only over a record snapshot and the catalog.

use super::{gating, ProgressionRecord};
use crate::catalog::Catalog;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LanguageProgress {
    pub language_id: String,
    pub name: String,
    pub completed: usize,
    pub total: usize,
}

/// One entry of the recent-activity feed, newest first. Title fields are
/// `None` when the key no longer resolves against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct RecentCompletion {
    pub lesson_key: String,
    pub language_name: Option<String>,
    pub lesson_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub completed_total: usize,
    pub lesson_total: usize,
    pub percent: f64,
    pub languages: Vec<LanguageProgress>,
}

impl ProgressSummary {
    pub fn for_user(record: &ProgressionRecord, catalog: &Catalog) -> Self {
        let languages: Vec<LanguageProgress> = catalog
            .languages()
            .iter()
            .map(|language| LanguageProgress {
                language_id: language.id.clone(),
                name: language.name.clone(),
                completed: gating::completed_count(language, record),
                total: language.lessons.len(),
            })
            .collect();
        let completed_total = languages.iter().map(|l| l.completed).sum();
        let lesson_total = languages.iter().map(|l| l.total).sum();
        let percent = if lesson_total == 0 {
            0.0
        } else {
            completed_total as f64 / lesson_total as f64 * 100.0
        };
        Self {
            completed_total,
            lesson_total,
            percent,
            languages,
        }
    }
}

/// The user's last `limit` completions, most recent first. This is the
/// consumer of `completed_lessons`' insertion order.
pub fn recent_activity(
    record: &ProgressionRecord,
    catalog: &Catalog,
    limit: usize,
) -> Vec<RecentCompletion> {
    record
        .completed_lessons
        .iter()
        .rev()
        .take(limit)
        .map(|key| {
            let resolved = key
                .split_once('-')
                .and_then(|(language_id, lesson_id)| {
                    let language = catalog.language(language_id)?;
                    let lesson = catalog.lesson(language_id, lesson_id)?;
                    Some((language.name.clone(), lesson.title.clone()))
                });
            match resolved {
                Some((language_name, lesson_title)) => RecentCompletion {
                    lesson_key: key.clone(),
                    language_name: Some(language_name),
                    lesson_title: Some(lesson_title),
                },
                None => RecentCompletion {
                    lesson_key: key.clone(),
                    language_name: None,
                    lesson_title: None,
                },
            }
        })
        .collect()
}
