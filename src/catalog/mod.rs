//! Read-only content catalog: languages, lessons, quizzes, and coding
//! challenges, loaded from structured JSON records and validated up front.
//!
//! The catalog is immutable at runtime. Lookups return `Option`; an absent
//! id is a navigable not-found state for the caller, not a failure.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A programming language track with its ordered lesson sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub description: String,
    pub lessons: Vec<Lesson>,
}

/// One lesson: theory content, a single-choice quiz, and coding challenges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub xp: u32,
    pub content: LessonContent,
    pub quiz: Vec<QuizQuestion>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContent {
    pub theory: String,
    #[serde(default)]
    pub code_examples: Vec<CodeExample>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExample {
    pub title: String,
    pub code: String,
    pub explanation: String,
}

/// Single-choice question; `correct_answer` indexes into `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub instruction: String,
    pub expected_output: String,
    pub hint: String,
    pub starter_code: String,
}

/// The full language catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    languages: Vec<Language>,
}

const BUILTIN_LANGUAGES: &[&str] = &[
    include_str!("data/python.json"),
    include_str!("data/javascript.json"),
    include_str!("data/rust.json"),
];

impl Catalog {
    /// Loads the records embedded in the binary.
    pub fn builtin() -> Result<Self> {
        let mut languages = Vec::new();
        for data in BUILTIN_LANGUAGES {
            let language: Language =
                serde_json::from_str(data).context("Failed parsing builtin catalog record")?;
            languages.push(language);
        }
        Self::from_languages(languages)
    }

    /// Loads one language record per `*.json` file in `dir`. Languages are
    /// ordered by id so the catalog is stable across filesystems.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut languages = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed reading catalog dir {:?}", dir))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path)?;
            let language: Language = serde_json::from_slice(&data)
                .with_context(|| format!("Failed parsing catalog record {:?}", path))?;
            languages.push(language);
        }
        languages.sort_by(|a, b| a.id.cmp(&b.id));
        Self::from_languages(languages)
    }

    pub fn from_languages(languages: Vec<Language>) -> Result<Self> {
        validate(&languages)?;
        Ok(Self { languages })
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn language(&self, language_id: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == language_id)
    }

    pub fn lesson(&self, language_id: &str, lesson_id: &str) -> Option<&Lesson> {
        self.language(language_id)?
            .lessons
            .iter()
            .find(|l| l.id == lesson_id)
    }

    /// Position of a lesson within its language, if both exist.
    pub fn lesson_index(&self, language_id: &str, lesson_id: &str) -> Option<usize> {
        self.language(language_id)?
            .lessons
            .iter()
            .position(|l| l.id == lesson_id)
    }
}

/// Catalog ids feed the `{language}-{lesson}` completion key, so the
/// separator must never occur inside an id.
pub fn valid_catalog_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn validate(languages: &[Language]) -> Result<()> {
    for (idx, language) in languages.iter().enumerate() {
        if !valid_catalog_id(&language.id) {
            bail!(
                "Invalid language id {:?}: ids must be lowercase alphanumeric/underscore",
                language.id
            );
        }
        if languages[..idx].iter().any(|other| other.id == language.id) {
            bail!("Duplicate language id {:?}", language.id);
        }
        if language.lessons.is_empty() {
            bail!("Language {:?} has no lessons", language.id);
        }
        for (lesson_idx, lesson) in language.lessons.iter().enumerate() {
            if !valid_catalog_id(&lesson.id) {
                bail!(
                    "Invalid lesson id {:?} in language {:?}",
                    lesson.id,
                    language.id
                );
            }
            if language.lessons[..lesson_idx]
                .iter()
                .any(|other| other.id == lesson.id)
            {
                bail!(
                    "Duplicate lesson id {:?} in language {:?}",
                    lesson.id,
                    language.id
                );
            }
            for question in &lesson.quiz {
                if question.options.is_empty() || question.correct_answer >= question.options.len()
                {
                    bail!(
                        "Quiz question {:?} in {}-{} has an out-of-range answer index",
                        question.question,
                        language.id,
                        lesson.id
                    );
                }
            }
        }
    }
    Ok(())
}
