//! The progression engine: owns every read and write of a user's
//! progression record. Creation, admin promotion, the daily coin/streak
//! reset, lesson completion, and manual coin grants all go through here.

use super::store::{ProgressionStore, TxnDecision};
use super::{CoinBalance, CompletionOutcome, LessonKey, ProgressionRecord, RecordPatch};
use crate::auth::Identity;
use crate::events::{EventType, ProgressionEventLog};
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::sync::Arc;

pub struct ProgressionEngine {
    store: Arc<dyn ProgressionStore>,
    events: Arc<ProgressionEventLog>,
    admin_email: Option<String>,
    daily_coins: u32,
}

impl ProgressionEngine {
    pub fn new(
        store: Arc<dyn ProgressionStore>,
        events: Arc<ProgressionEventLog>,
        admin_email: Option<String>,
        daily_coins: u32,
    ) -> Self {
        Self {
            store,
            events,
            admin_email,
            daily_coins,
        }
    }

    pub fn store(&self) -> &Arc<dyn ProgressionStore> {
        &self.store
    }

    /// Loads the record for an authenticated identity, creating it on first
    /// sign-in, then applies admin promotion and the daily reset. At most
    /// two store writes per call.
    pub fn load_or_create(&self, identity: &Identity) -> Result<ProgressionRecord> {
        self.load_or_create_on(identity, Utc::now().date_naive())
    }

    /// Variant of [`load_or_create`](Self::load_or_create) taking the
    /// calendar day explicitly.
    pub fn load_or_create_on(
        &self,
        identity: &Identity,
        today: NaiveDate,
    ) -> Result<ProgressionRecord> {
        let should_be_admin = self.is_admin_email(&identity.email);

        let Some(mut record) = self.store.get(&identity.user_id)? else {
            return self.create_record(identity, should_be_admin, today);
        };

        // One-way promotion: accounts flagged admin stay admin even if the
        // configured email changes later.
        if should_be_admin && !record.is_admin {
            let patch = RecordPatch::new()
                .with_is_admin(true)
                .with_coins(CoinBalance::Unlimited);
            self.store.update_fields(&record.user_id, &patch)?;
            patch.apply_to(&mut record);
            self.events.append(
                &record.user_id,
                EventType::AdminPromoted,
                json!({ "email": record.email }),
            )?;
        }

        if !record.is_admin {
            self.apply_daily_reset(&mut record, today)?;
        }
        Ok(record)
    }

    fn create_record(
        &self,
        identity: &Identity,
        is_admin: bool,
        today: NaiveDate,
    ) -> Result<ProgressionRecord> {
        let display_name = identity
            .display_name
            .clone()
            .unwrap_or_else(|| email_local_part(&identity.email));
        let record = ProgressionRecord {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
            display_name,
            coins: if is_admin {
                CoinBalance::Unlimited
            } else {
                CoinBalance::Coins(self.daily_coins)
            },
            is_admin,
            completed_lessons: Vec::new(),
            streak: 1,
            last_login_date: today,
            created_at: Utc::now(),
        };
        self.store.create(&record)?;
        self.events.append(
            &record.user_id,
            EventType::UserCreated,
            json!({ "email": record.email, "is_admin": record.is_admin }),
        )?;
        Ok(record)
    }

    /// Once per calendar day: replenish coins and move the streak along.
    /// A login on the day after the last one extends the streak; any wider
    /// gap restarts it at 1, since the day of return still counts.
    fn apply_daily_reset(&self, record: &mut ProgressionRecord, today: NaiveDate) -> Result<()> {
        if record.last_login_date == today {
            return Ok(());
        }
        let streak = if today.pred_opt() == Some(record.last_login_date) {
            record.streak + 1
        } else {
            1
        };
        let patch = RecordPatch::new()
            .with_coins(CoinBalance::Coins(self.daily_coins))
            .with_streak(streak)
            .with_last_login_date(today);
        self.store.update_fields(&record.user_id, &patch)?;
        patch.apply_to(record);
        self.events.append(
            &record.user_id,
            EventType::DailyReset,
            json!({ "streak": streak, "coins": self.daily_coins, "date": today }),
        )?;
        Ok(())
    }

    /// Records a lesson completion, spending one coin for non-admins.
    ///
    /// The membership check, the append, and the debit run as one
    /// conditional store update, so two racing attempts for the same key
    /// can never both charge: the loser observes the winner's append and
    /// resolves to `AlreadyCompleted`.
    pub fn complete_lesson(&self, user_id: &str, key: &LessonKey) -> Result<CompletionOutcome> {
        let mut outcome = CompletionOutcome::Completed;
        self.store.update_conditional(user_id, &mut |record| {
            if record.has_completed(key) {
                outcome = CompletionOutcome::AlreadyCompleted;
                return TxnDecision::Abort;
            }
            if !record.is_admin && !record.coins.can_spend() {
                outcome = CompletionOutcome::InsufficientCoins;
                return TxnDecision::Abort;
            }
            outcome = CompletionOutcome::Completed;
            let mut patch = RecordPatch::new().with_completed_lesson(key);
            if !record.is_admin {
                patch = patch.with_coins(record.coins.debited());
            }
            TxnDecision::Commit(patch)
        })?;

        match outcome {
            CompletionOutcome::Completed => {
                self.events.append(
                    user_id,
                    EventType::LessonCompleted,
                    json!({ "lesson_key": key.as_str() }),
                )?;
            }
            CompletionOutcome::InsufficientCoins => {
                self.events.append(
                    user_id,
                    EventType::CompletionRejected,
                    json!({ "lesson_key": key.as_str(), "reason": "insufficient_coins" }),
                )?;
            }
            CompletionOutcome::AlreadyCompleted => {}
        }
        Ok(outcome)
    }

    /// Adds `delta` coins to a finite balance (admin grants, refunds).
    /// Admin accounts are a no-op. No clamping: a delta that would push the
    /// balance below zero is the caller's mistake and fails loudly.
    pub fn adjust_coins(&self, user_id: &str, delta: i64) -> Result<()> {
        let record = self
            .store
            .get(user_id)?
            .with_context(|| format!("No progression record for user {user_id}"))?;
        if record.is_admin {
            return Ok(());
        }
        let CoinBalance::Coins(current) = record.coins else {
            return Ok(());
        };
        let next = i64::from(current) + delta;
        if next < 0 {
            bail!(
                "Coin adjustment of {delta} would leave user {user_id} with a negative balance"
            );
        }
        let patch = RecordPatch::new().with_coins(CoinBalance::Coins(next as u32));
        self.store.update_fields(user_id, &patch)?;
        self.events.append(
            user_id,
            EventType::CoinsAdjusted,
            json!({ "delta": delta, "balance": next }),
        )?;
        Ok(())
    }

    fn is_admin_email(&self, email: &str) -> bool {
        // Exact comparison; case variants of the admin address do not match.
        self.admin_email.as_deref() == Some(email)
    }
}

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
