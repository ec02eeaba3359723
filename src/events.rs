use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Progression lifecycle events recorded for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    UserCreated,
    AdminPromoted,
    DailyReset,
    LessonCompleted,
    CompletionRejected,
    CoinsAdjusted,
    SignedIn,
    SignedOut,
}

/// One audit entry, stored as a JSONL line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionEvent {
    pub event_id: Uuid,
    pub user_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

/// Append-only event log shared by every session on this install.
pub struct ProgressionEventLog {
    events_path: PathBuf,
}

impl ProgressionEventLog {
    pub fn at(events_path: PathBuf) -> Self {
        Self { events_path }
    }

    pub fn append(
        &self,
        user_id: &str,
        event_type: EventType,
        details: serde_json::Value,
    ) -> Result<Uuid> {
        let event = ProgressionEvent {
            event_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            event_type,
            timestamp: Utc::now(),
            details,
        };
        if let Some(parent) = self.events_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .with_context(|| format!("Failed opening event log {:?}", self.events_path))?;
        file.write_all(serde_json::to_string(&event)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(event.event_id)
    }

    pub fn read_all(&self) -> Result<Vec<ProgressionEvent>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.events_path)?;
        let mut events = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            let event: ProgressionEvent = serde_json::from_str(line)
                .with_context(|| format!("Failed parsing event line in {:?}", self.events_path))?;
            events.push(event);
        }
        Ok(events)
    }
}
