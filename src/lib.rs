pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod events;
pub mod progression;
pub mod session;

// Re-export commonly used types for convenience.
pub use app::{AppContext, LessonEntry};
pub use auth::{FederatedProfile, Identity, IdentityProvider};
pub use catalog::{Catalog, Language, Lesson};
pub use config::{AppConfig, DAILY_FREE_COINS};
pub use progression::{
    CoinBalance, CompletionOutcome, LessonKey, LessonStatus, ProgressionEngine, ProgressionRecord,
};
pub use session::{LessonSession, SessionPhase};
