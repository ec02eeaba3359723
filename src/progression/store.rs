//! Persistence seam for progression records.
//!
//! The trait mirrors the document-store contract the engine needs: point
//! reads, create-if-absent, targeted field updates, and a conditional
//! update used by the completion path. Implementations must be shareable
//! across concurrent sessions of the same user.

use super::{ProgressionRecord, RecordPatch};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Verdict returned by a conditional-update closure.
pub enum TxnDecision {
    /// Apply the patch atomically with the check that produced it.
    Commit(RecordPatch),
    /// Leave the record untouched.
    Abort,
}

pub trait ProgressionStore: Send + Sync {
    fn get(&self, user_id: &str) -> Result<Option<ProgressionRecord>>;

    /// Persists a brand-new record; fails if the key already exists.
    fn create(&self, record: &ProgressionRecord) -> Result<()>;

    /// Applies only the populated patch fields to an existing record.
    fn update_fields(&self, user_id: &str, patch: &RecordPatch) -> Result<()>;

    /// Check-and-apply primitive: `decide` inspects the current record and
    /// either commits a patch or aborts. The check and the write happen
    /// under the store's write lock, so two racing callers observe each
    /// other's commits. Returns the post-commit record, or `None` on abort.
    fn update_conditional(
        &self,
        user_id: &str,
        decide: &mut dyn FnMut(&ProgressionRecord) -> TxnDecision,
    ) -> Result<Option<ProgressionRecord>>;
}

/// File-backed store: one pretty-printed JSON document per user.
///
/// The write lock is per store instance, so concurrent sessions must share
/// the instance (behind an `Arc`) to get the conditional-update guarantee.
/// Cross-process atomicity is the job of a real document store behind the
/// same trait.
pub struct FileProgressionStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileProgressionStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed creating progression store dir {:?}", root))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{user_id}.json"))
    }

    fn read(&self, user_id: &str) -> Result<Option<ProgressionRecord>> {
        let path = self.path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)
            .with_context(|| format!("Failed reading progression record {:?}", path))?;
        let record = serde_json::from_slice(&data)
            .with_context(|| format!("Failed parsing progression record {:?}", path))?;
        Ok(Some(record))
    }

    fn write(&self, record: &ProgressionRecord) -> Result<()> {
        let path = self.path(&record.user_id);
        let data = serde_json::to_vec_pretty(record)?;
        fs::write(&path, data)
            .with_context(|| format!("Failed writing progression record {:?}", path))?;
        Ok(())
    }
}

impl ProgressionStore for FileProgressionStore {
    fn get(&self, user_id: &str) -> Result<Option<ProgressionRecord>> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        self.read(user_id)
    }

    fn create(&self, record: &ProgressionRecord) -> Result<()> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        if self.path(&record.user_id).exists() {
            bail!("Progression record already exists for user {}", record.user_id);
        }
        self.write(record)
    }

    fn update_fields(&self, user_id: &str, patch: &RecordPatch) -> Result<()> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        let mut record = self
            .read(user_id)?
            .with_context(|| format!("No progression record for user {user_id}"))?;
        patch.apply_to(&mut record);
        self.write(&record)
    }

    fn update_conditional(
        &self,
        user_id: &str,
        decide: &mut dyn FnMut(&ProgressionRecord) -> TxnDecision,
    ) -> Result<Option<ProgressionRecord>> {
        let _guard = self.write_lock.lock().expect("store lock poisoned");
        let mut record = self
            .read(user_id)?
            .with_context(|| format!("No progression record for user {user_id}"))?;
        match decide(&record) {
            TxnDecision::Abort => Ok(None),
            TxnDecision::Commit(patch) => {
                patch.apply_to(&mut record);
                self.write(&record)?;
                Ok(Some(record))
            }
        }
    }
}
