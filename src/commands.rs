//! Command implementations for nudge.
//!
//! Exactly one intent runs per invocation, mapped onto hint store
//! operations. Every mutation is recorded in the audit log; listing is a
//! pure read.

use crate::cli::NudgeCli;
use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use crate::events::{Event, EventAction, append_event};
use crate::hints::{self, Directive};
use chrono::Utc;
use serde_json::json;

/// Dispatch a parsed invocation to its implementation.
///
/// Resolving the context fails with a user error (exit code 1) outside a
/// tracked repository.
pub fn dispatch(cli: NudgeCli) -> Result<()> {
    let ctx = ScoutContext::resolve()?;

    if cli.list {
        cmd_list(&ctx)
    } else if cli.clear {
        cmd_clear(&ctx)
    } else if cli.drill_pause {
        cmd_directive(&ctx, Directive::DrillPause)
    } else if cli.drill_resume {
        cmd_directive(&ctx, Directive::DrillResume)
    } else if cli.drill_disable {
        cmd_directive(&ctx, Directive::DrillDisable)
    } else {
        cmd_add(&ctx, &cli.hint_text())
    }
}

fn cmd_add(ctx: &ScoutContext, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ScoutError::UserError(
            "hint text is empty. Pass a free-text hint, or one of --list, --clear, \
             --drill-pause, --drill-resume, --drill-disable."
                .to_string(),
        ));
    }

    let hint = hints::add_hint(ctx, text)?;
    append_event(
        ctx,
        &Event::new(EventAction::HintAdd).with_details(json!({"id": hint.id, "text": hint.text})),
    )?;

    println!("Recorded {} for the next scout cycle: {}", hint.id, hint.text);
    Ok(())
}

fn cmd_directive(ctx: &ScoutContext, directive: Directive) -> Result<()> {
    let hint = hints::add_directive(ctx, directive.as_str())?;
    append_event(
        ctx,
        &Event::new(EventAction::DirectiveAdd)
            .with_details(json!({"id": hint.id, "directive": directive.as_str()})),
    )?;

    println!("Recorded {} for the next scout cycle: {}", hint.id, directive);
    Ok(())
}

fn cmd_list(ctx: &ScoutContext) -> Result<()> {
    let all = hints::read_hints(ctx);
    let pending_hints = hints::pending_hints(&all);
    let pending_directives = hints::pending_directives(&all);

    if pending_hints.is_empty() && pending_directives.is_empty() {
        println!("No pending hints or directives.");
        return Ok(());
    }

    let now_ms = Utc::now().timestamp_millis();

    if !pending_hints.is_empty() {
        println!("Pending hints ({}):", pending_hints.len());
        for hint in &pending_hints {
            println!(
                "  {}  {}  ({}s ago)",
                hint.id,
                hint.text,
                hint.age_seconds(now_ms)
            );
        }
    }

    if !pending_directives.is_empty() {
        println!("Pending directives ({}):", pending_directives.len());
        for hint in &pending_directives {
            println!(
                "  {}  {}  ({}s ago)",
                hint.id,
                hint.text,
                hint.age_seconds(now_ms)
            );
        }
    }

    Ok(())
}

fn cmd_clear(ctx: &ScoutContext) -> Result<()> {
    let removed = hints::read_hints(ctx).len();
    hints::clear_hints(ctx)?;
    append_event(
        ctx,
        &Event::new(EventAction::HintClear).with_details(json!({"removed": removed})),
    )?;

    if removed == 0 {
        println!("Hint store is already empty.");
    } else if removed == 1 {
        println!("Cleared 1 entry.");
    } else {
        println!("Cleared {} entries.", removed);
    }

    Ok(())
}
