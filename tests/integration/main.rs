use chrono::NaiveDate;
use learnbase::app::AppContext;
use learnbase::auth::Identity;
use learnbase::config::{self, AppConfig};
use std::path::Path;
use tempfile::TempDir;

mod accounts;
mod admin;
mod concurrency;
mod summaries;

pub struct IntegrationHarness {
    workspace: TempDir,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        Self { workspace }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    pub fn context(&self) -> AppContext {
        AppContext::open_at(self.workspace.path().to_path_buf())
            .expect("failed to open AppContext for tests")
    }

    /// Writes a config naming `email` as the administrator before opening
    /// the context.
    pub fn context_with_admin(&self, email: &str) -> AppContext {
        let paths = config::ensure_workspace_at(self.workspace.path().to_path_buf())
            .expect("failed to prepare workspace");
        let app_config = AppConfig {
            admin_email: Some(email.to_string()),
            ..AppConfig::default()
        };
        config::save(&paths, &app_config).expect("failed to write test config");
        self.context()
    }
}

pub fn identity(tag: &str) -> Identity {
    Identity {
        user_id: format!("user-{tag}"),
        email: format!("{tag}@example.com"),
        display_name: None,
    }
}

pub fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).expect("valid test date")
}
