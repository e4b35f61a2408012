//! Hint/directive store: durable operator input for the scout loop.
//!
//! The store is one JSON file per repository (`.scout/hints.json`) holding an
//! ordered array of [`Hint`] records. A short-lived writer (the `nudge`
//! command) appends entries; the long-running loop reads and consumes them
//! once per cycle. Free-text hints and control directives are the same record
//! type, distinguished by the presence of the `directive` field.
//!
//! # Guarantees and non-guarantees
//!
//! - Append order is preserved on read, and `created_at` never decreases in
//!   append order (clamped against the previous entry across clock steps).
//! - Ids are unique within one store.
//! - [`take_pending`] persists the consumed flags before returning, so a
//!   correct consumer never re-delivers an entry.
//! - A missing or unreadable backing file reads as an empty store; the
//!   coordination channel can never stall the loop.
//! - There is no locking. The operator command and the loop may race, in
//!   which case the most recent whole-file write wins. With one operator and
//!   one loop this loses at most one update in a pathological interleaving —
//!   an accepted limitation, not a bug to engineer around. A lock file would
//!   trade it for stale-lock failure modes that can block the loop.

use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Control directives for drill mode.
///
/// The wire names carry a `drill:` namespace so future directive families
/// don't collide with these values in existing store files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Pause drill mode after the current cycle.
    #[serde(rename = "drill:pause")]
    DrillPause,
    /// Resume a paused drill mode.
    #[serde(rename = "drill:resume")]
    DrillResume,
    /// Disable drill mode entirely.
    #[serde(rename = "drill:disable")]
    DrillDisable,
}

impl Directive {
    /// The wire name of this directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::DrillPause => "drill:pause",
            Directive::DrillResume => "drill:resume",
            Directive::DrillDisable => "drill:disable",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "drill:pause" => Ok(Directive::DrillPause),
            "drill:resume" => Ok(Directive::DrillResume),
            "drill:disable" => Ok(Directive::DrillDisable),
            other => Err(ScoutError::UserError(format!(
                "unknown directive '{}' (expected drill:pause, drill:resume, or drill:disable)",
                other
            ))),
        }
    }
}

/// One operator input: a free-text steering hint, or a control directive
/// when `directive` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    /// Unique id within this store (e.g. `hint-003`).
    pub id: String,

    /// Human-readable text. For directives this is the wire name.
    pub text: String,

    /// Creation time as epoch milliseconds; non-decreasing in append order.
    pub created_at: i64,

    /// Whether a consumer has already acted on this entry.
    pub consumed: bool,

    /// Present iff this entry is a control directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<Directive>,
}

impl Hint {
    /// Whether this entry is a control directive rather than a free-text hint.
    pub fn is_directive(&self) -> bool {
        self.directive.is_some()
    }

    /// Whole seconds elapsed since creation, given the current epoch-ms time.
    pub fn age_seconds(&self, now_ms: i64) -> i64 {
        (now_ms - self.created_at).max(0) / 1000
    }
}

/// Append a new unconsumed free-text hint and return it.
pub fn add_hint(ctx: &ScoutContext, text: &str) -> Result<Hint> {
    append(ctx, text.to_string(), None)
}

/// Append a control directive.
///
/// `name` must be one of the drill-control wire names; anything else is
/// rejected without touching the store.
pub fn add_directive(ctx: &ScoutContext, name: &str) -> Result<Hint> {
    let directive = Directive::from_str(name)?;
    append(ctx, directive.as_str().to_string(), Some(directive))
}

/// Read all entries (consumed and unconsumed) in append order.
///
/// A missing or unreadable store reads as empty: the coordination file must
/// never block its consumers, and the next write replaces whatever is there.
pub fn read_hints(ctx: &ScoutContext) -> Vec<Hint> {
    load(ctx)
}

/// Remove all entries unconditionally. Idempotent.
pub fn clear_hints(ctx: &ScoutContext) -> Result<()> {
    match std::fs::remove_file(ctx.hints_file()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ScoutError::StoreError(format!(
            "failed to clear hint store '{}': {}",
            ctx.hints_file().display(),
            e
        ))),
    }
}

/// Read and consume all pending entries, in append order.
///
/// The consumed flags are persisted before this returns, so a later read
/// never re-delivers an entry. Marking happens before the caller acts: a
/// crash mid-cycle drops steering input rather than replaying it, which is
/// the right failure mode for at-most-once hints. The returned entries are
/// snapshots taken before marking.
///
/// Single-active-consumer-per-repository is the caller's invariant; the
/// store does not enforce it.
pub fn take_pending(ctx: &ScoutContext) -> Result<Vec<Hint>> {
    let mut hints = load(ctx);
    let pending: Vec<Hint> = hints.iter().filter(|h| !h.consumed).cloned().collect();

    if pending.is_empty() {
        return Ok(pending);
    }

    for hint in hints.iter_mut() {
        hint.consumed = true;
    }
    save(ctx, &hints)?;

    // Best effort: auditing must never stall the loop.
    let ids: Vec<&str> = pending.iter().map(|h| h.id.as_str()).collect();
    let _ = append_event(
        ctx,
        &Event::new(EventAction::HintConsume).with_details(json!({ "ids": ids })),
    );

    Ok(pending)
}

/// Unconsumed free-text hints, in append order.
pub fn pending_hints(hints: &[Hint]) -> Vec<&Hint> {
    hints
        .iter()
        .filter(|h| !h.consumed && !h.is_directive())
        .collect()
}

/// Unconsumed directives, in append order.
pub fn pending_directives(hints: &[Hint]) -> Vec<&Hint> {
    hints
        .iter()
        .filter(|h| !h.consumed && h.is_directive())
        .collect()
}

fn append(ctx: &ScoutContext, text: String, directive: Option<Directive>) -> Result<Hint> {
    let mut hints = load(ctx);

    let hint = Hint {
        id: next_id(&hints),
        text,
        created_at: next_created_at(&hints),
        consumed: false,
        directive,
    };

    hints.push(hint.clone());
    save(ctx, &hints)?;

    Ok(hint)
}

fn load(ctx: &ScoutContext) -> Vec<Hint> {
    let Ok(content) = std::fs::read_to_string(ctx.hints_file()) else {
        return Vec::new();
    };
    serde_json::from_str(&content).unwrap_or_default()
}

fn save(ctx: &ScoutContext, hints: &[Hint]) -> Result<()> {
    let content = serde_json::to_string_pretty(hints)
        .map_err(|e| ScoutError::StoreError(format!("failed to serialize hint store: {}", e)))?;
    atomic_write_file(ctx.hints_file(), &content)
}

/// Next id by scanning the store for the highest `hint-NNN` suffix.
///
/// Ids only need to be unique within one store, so the sequence restarting
/// after `clear_hints` is fine.
fn next_id(hints: &[Hint]) -> String {
    let max = hints
        .iter()
        .filter_map(|h| h.id.strip_prefix("hint-"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("hint-{:03}", max + 1)
}

/// Current time, clamped so `created_at` never decreases in append order.
fn next_created_at(hints: &[Hint]) -> i64 {
    let now = Utc::now().timestamp_millis();
    match hints.last() {
        Some(last) => now.max(last.created_at),
        None => now,
    }
}
