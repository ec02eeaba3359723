pub mod engine;
pub mod gating;
pub mod store;
pub mod summary;

pub use engine::ProgressionEngine;
pub use gating::{completed_count, lesson_status, nearest_unlocked};
pub use store::{FileProgressionStore, ProgressionStore, TxnDecision};
pub use summary::{recent_activity, LanguageProgress, ProgressSummary, RecentCompletion};

use crate::catalog::valid_catalog_id;
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coin balance of an account. Admin accounts hold an unlimited balance that
/// no arithmetic can touch; everyone else holds a finite, non-negative count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CoinBalance {
    Unlimited,
    Coins(u32),
}

impl CoinBalance {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, CoinBalance::Unlimited)
    }

    /// Whether one coin can be spent right now.
    pub fn can_spend(&self) -> bool {
        match self {
            CoinBalance::Unlimited => true,
            CoinBalance::Coins(n) => *n >= 1,
        }
    }

    /// Balance after spending one coin. Unlimited balances are untouched.
    pub fn debited(self) -> CoinBalance {
        match self {
            CoinBalance::Unlimited => CoinBalance::Unlimited,
            CoinBalance::Coins(n) => CoinBalance::Coins(n.saturating_sub(1)),
        }
    }
}

/// Per-user progression document. Owned exclusively by the
/// [`ProgressionEngine`]; everything else reads it as a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub coins: CoinBalance,
    pub is_admin: bool,
    /// Completion keys in insertion order, duplicate-free. Order feeds the
    /// recent-activity view; membership feeds gating.
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    pub streak: u32,
    pub last_login_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl ProgressionRecord {
    pub fn has_completed(&self, key: &LessonKey) -> bool {
        self.completed_lessons.iter().any(|k| k == key.as_str())
    }
}

/// Targeted field update applied by the store. Only the populated fields
/// change; concurrent sessions editing disjoint fields do not clobber each
/// other with whole-record overwrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub coins: Option<CoinBalance>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub streak: Option<u32>,
    #[serde(default)]
    pub last_login_date: Option<NaiveDate>,
    /// Appended to `completed_lessons`; never replaces the sequence.
    #[serde(default)]
    pub push_completed_lesson: Option<String>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coins(mut self, coins: CoinBalance) -> Self {
        self.coins = Some(coins);
        self
    }

    pub fn with_is_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = Some(is_admin);
        self
    }

    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn with_last_login_date(mut self, date: NaiveDate) -> Self {
        self.last_login_date = Some(date);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_completed_lesson(mut self, key: &LessonKey) -> Self {
        self.push_completed_lesson = Some(key.as_str().to_string());
        self
    }

    /// Applies the populated fields to `record` in place.
    pub fn apply_to(&self, record: &mut ProgressionRecord) {
        if let Some(name) = &self.display_name {
            record.display_name = name.clone();
        }
        if let Some(coins) = self.coins {
            record.coins = coins;
        }
        if let Some(is_admin) = self.is_admin {
            record.is_admin = is_admin;
        }
        if let Some(streak) = self.streak {
            record.streak = streak;
        }
        if let Some(date) = self.last_login_date {
            record.last_login_date = date;
        }
        if let Some(key) = &self.push_completed_lesson {
            if !record.completed_lessons.iter().any(|k| k == key) {
                record.completed_lessons.push(key.clone());
            }
        }
    }
}

/// Stable identity of one lesson's completion state, `{language}-{lesson}`.
///
/// Construction validates that neither id contains the separator, so a key
/// can never be ambiguous across languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LessonKey(String);

impl LessonKey {
    pub fn new(language_id: &str, lesson_id: &str) -> Result<Self> {
        if !valid_catalog_id(language_id) {
            bail!("Invalid language id {:?} in lesson key", language_id);
        }
        if !valid_catalog_id(lesson_id) {
            bail!("Invalid lesson id {:?} in lesson key", lesson_id);
        }
        Ok(Self(format!("{language_id}-{lesson_id}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a completion attempt. `AlreadyCompleted` and
/// `InsufficientCoins` are ordinary outcomes, not transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
    InsufficientCoins,
}

/// Navigability of one lesson for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Locked,
    Unlocked,
    Completed,
}
