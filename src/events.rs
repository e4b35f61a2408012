//! Append-only event log for scout.
//!
//! Store mutations are recorded as NDJSON (one JSON object per line) in
//! `.scout/events.ndjson`, giving the operator an audit trail of who steered
//! the loop and when. Consumers append best-effort: the log exists to explain
//! the loop's behavior after the fact, never to gate it.
//!
//! Each event carries:
//! - `ts`: RFC3339 timestamp
//! - `action`: the action performed
//! - `actor`: the owner string (e.g. `user@HOST`)
//! - `details`: freeform object with action-specific details

use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Free-text hint appended
    HintAdd,
    /// Control directive appended
    DirectiveAdd,
    /// Store cleared
    HintClear,
    /// Pending entries consumed by the loop
    HintConsume,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::HintAdd => write!(f, "hint_add"),
            EventAction::DirectiveAdd => write!(f, "directive_add"),
            EventAction::HintClear => write!(f, "hint_clear"),
            EventAction::HintConsume => write!(f, "hint_consume"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g. `user@HOST`).
    pub actor: String,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event stamped with the current time and the actor
    /// derived from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ScoutError::StoreError(format!("failed to serialize event: {}", e)))
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to `.scout/events.ndjson`, creating the state directory
/// and the file as needed. Each append is one line with a trailing newline.
pub fn append_event(ctx: &ScoutContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();
    let json_line = event.to_ndjson_line()?;

    if !ctx.scout_dir.exists() {
        fs::create_dir_all(&ctx.scout_dir).map_err(|e| {
            ScoutError::StoreError(format!(
                "failed to create state directory '{}': {}",
                ctx.scout_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            ScoutError::StoreError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        ScoutError::StoreError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_ctx() -> (TempDir, ScoutContext) {
        let temp_dir = TempDir::new().unwrap();
        let ctx = ScoutContext {
            repo_root: temp_dir.path().to_path_buf(),
            scout_dir: temp_dir.path().join(".scout"),
        };
        (temp_dir, ctx)
    }

    #[test]
    fn event_creation_stamps_time_and_actor() {
        let event = Event::new(EventAction::HintAdd);

        assert_eq!(event.action, EventAction::HintAdd);
        assert!(event.actor.contains('@'));
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn event_serializes_to_single_snake_case_line() {
        let event = Event::new(EventAction::DirectiveAdd)
            .with_details(json!({"directive": "drill:pause"}));

        let line = event.to_ndjson_line().unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"directive_add\""));

        let parsed: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.action, EventAction::DirectiveAdd);
        assert_eq!(parsed.details["directive"], "drill:pause");
    }

    #[test]
    fn append_creates_dir_and_file() {
        let (_tmp, ctx) = test_ctx();
        assert!(!ctx.events_file().exists());

        append_event(&ctx, &Event::new(EventAction::HintAdd)).unwrap();

        let content = fs::read_to_string(ctx.events_file()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn append_accumulates_lines_in_order() {
        let (_tmp, ctx) = test_ctx();

        append_event(&ctx, &Event::new(EventAction::HintAdd)).unwrap();
        append_event(&ctx, &Event::new(EventAction::HintClear)).unwrap();

        let content = fs::read_to_string(ctx.events_file()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Event = serde_json::from_str(lines[0]).unwrap();
        let second: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.action, EventAction::HintAdd);
        assert_eq!(second.action, EventAction::HintClear);
    }

    #[test]
    fn action_display_matches_wire_names() {
        assert_eq!(EventAction::HintAdd.to_string(), "hint_add");
        assert_eq!(EventAction::DirectiveAdd.to_string(), "directive_add");
        assert_eq!(EventAction::HintClear.to_string(), "hint_clear");
        assert_eq!(EventAction::HintConsume.to_string(), "hint_consume");
    }
}
