//! Per-session application context.
//!
//! One `AppContext` is constructed when a session starts and dropped when
//! it ends; components receive it by reference. There is no ambient global
//! state, so two sessions of the same user only share what the store
//! shares.

use crate::auth::{FederatedProfile, Identity, IdentityProvider, LocalAccountDirectory};
use crate::catalog::Catalog;
use crate::config::{self, AppConfig, WorkspacePaths};
use crate::events::{EventType, ProgressionEventLog};
use crate::progression::{
    gating, recent_activity, FileProgressionStore, LessonStatus, ProgressionEngine,
    ProgressionRecord, ProgressSummary, RecentCompletion,
};
use crate::session::LessonSession;
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of navigating to a lesson: a playable session, or a redirect to
/// the closest playable lesson when the requested one is locked.
pub enum LessonEntry<'a> {
    Session(LessonSession<'a>),
    Redirect { lesson_index: usize },
}

pub struct AppContext {
    pub config: AppConfig,
    pub paths: WorkspacePaths,
    catalog: Catalog,
    provider: Box<dyn IdentityProvider>,
    events: Arc<ProgressionEventLog>,
    engine: ProgressionEngine,
    identity: Option<Identity>,
    record: Option<ProgressionRecord>,
}

impl AppContext {
    /// Opens the context over the default workspace location.
    pub fn open() -> Result<Self> {
        Self::open_at(config::workspace_root()?)
    }

    /// Opens the context rooted at an explicit path, wiring the builtin
    /// catalog and the local account directory.
    pub fn open_at(root: PathBuf) -> Result<Self> {
        let paths = config::ensure_workspace_at(root)?;
        let provider = Box::new(LocalAccountDirectory::new(paths.accounts_dir.clone())?);
        let catalog = Catalog::builtin()?;
        Self::assemble(paths, catalog, provider)
    }

    /// Full wiring control for callers that bring their own catalog or
    /// identity provider.
    pub fn assemble(
        paths: WorkspacePaths,
        catalog: Catalog,
        provider: Box<dyn IdentityProvider>,
    ) -> Result<Self> {
        let config = config::load_or_default(&paths)?;
        let events = Arc::new(ProgressionEventLog::at(paths.events_path()));
        let store = Arc::new(FileProgressionStore::new(paths.users_dir.clone())?);
        let engine = ProgressionEngine::new(
            store,
            events.clone(),
            config.effective_admin_email(),
            config.progression.daily_coins,
        );
        Ok(Self {
            config,
            paths,
            catalog,
            provider,
            events,
            engine,
            identity: None,
            record: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<&ProgressionRecord> {
        let identity = self.provider.sign_in(email, password)?;
        self.adopt_identity(identity)
    }

    pub fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<&ProgressionRecord> {
        let identity = self.provider.sign_up(email, password, display_name)?;
        self.adopt_identity(identity)
    }

    pub fn sign_in_federated(&mut self, profile: &FederatedProfile) -> Result<&ProgressionRecord> {
        let identity = self.provider.sign_in_federated(profile)?;
        self.adopt_identity(identity)
    }

    fn adopt_identity(&mut self, identity: Identity) -> Result<&ProgressionRecord> {
        let record = self.engine.load_or_create(&identity)?;
        self.events.append(
            &identity.user_id,
            EventType::SignedIn,
            json!({ "email": identity.email }),
        )?;
        self.identity = Some(identity);
        self.record = Some(record);
        self.record()
    }

    /// Drops the active identity and its cached record.
    pub fn sign_out(&mut self) -> Result<()> {
        if let Some(identity) = self.identity.take() {
            self.provider.sign_out()?;
            self.events
                .append(&identity.user_id, EventType::SignedOut, json!({}))?;
        }
        self.record = None;
        Ok(())
    }

    /// Snapshot of the signed-in user's progression record.
    pub fn record(&self) -> Result<&ProgressionRecord> {
        self.record
            .as_ref()
            .context("Not signed in; sign in before using progression features")
    }

    /// Re-reads the record through the engine, picking up daily resets and
    /// writes made by other sessions.
    pub fn refresh_record(&mut self) -> Result<&ProgressionRecord> {
        let identity = self
            .identity
            .clone()
            .context("Not signed in; sign in before using progression features")?;
        let record = self.engine.load_or_create(&identity)?;
        self.record = Some(record);
        self.record()
    }

    /// Navigates to a lesson. Locked lessons are rejected with a redirect
    /// to the nearest playable predecessor instead of a session.
    pub fn start_lesson(&self, language_id: &str, lesson_id: &str) -> Result<LessonEntry<'_>> {
        let record = self.record()?;
        let language = self
            .catalog
            .language(language_id)
            .with_context(|| format!("Language {language_id:?} not found"))?;
        let lesson_index = self
            .catalog
            .lesson_index(language_id, lesson_id)
            .with_context(|| format!("Lesson {lesson_id:?} not found in {language_id:?}"))?;
        match gating::lesson_status(language, lesson_index, record) {
            Some(LessonStatus::Locked) => Ok(LessonEntry::Redirect {
                lesson_index: gating::nearest_unlocked(language, lesson_index, record),
            }),
            Some(_) => {
                let lesson = &language.lessons[lesson_index];
                let session = LessonSession::new(
                    &self.engine,
                    record.user_id.clone(),
                    language_id,
                    lesson,
                )?;
                Ok(LessonEntry::Session(session))
            }
            None => bail!("Lesson index {lesson_index} out of range"),
        }
    }

    pub fn progress_summary(&self) -> Result<ProgressSummary> {
        Ok(ProgressSummary::for_user(self.record()?, &self.catalog))
    }

    pub fn recent_activity(&self, limit: usize) -> Result<Vec<RecentCompletion>> {
        Ok(recent_activity(self.record()?, &self.catalog, limit))
    }
}
