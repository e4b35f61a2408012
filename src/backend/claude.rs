//! Claude Code backend.
//!
//! Drives the `claude` CLI in non-interactive print mode. The tool is asked
//! for stream-json output (one JSON event per line), which is also what
//! makes coarse progress phases derivable: the event `type` field says what
//! the agent is doing without parsing any content.

use super::{CommandPlan, split_extra_args, profile_env};
use crate::config::ScoutConfig;

/// Environment variable carrying the credential for this backend family.
const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

pub(super) fn plan(config: &ScoutConfig) -> Result<CommandPlan, String> {
    let profile = config.profile("claude");

    let mut args = vec![
        "--print".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ];
    if let Some(model) = &profile.model {
        args.push("--model".to_string());
        args.push(model.clone());
    }
    args.extend(split_extra_args(&profile.extra_args)?);

    let mut env = profile_env(&profile.env);
    if let Some(key) = &profile.api_key {
        env.push((API_KEY_VAR.to_string(), key.clone()));
    }

    Ok(CommandPlan {
        program: "claude".to_string(),
        args,
        env,
    })
}

/// Coarse phase from a stream-json event line.
pub(super) fn phase(chunk: &str) -> Option<&'static str> {
    let line = chunk.lines().next()?;
    let event: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    match event.get("type")?.as_str()? {
        "system" => Some("starting"),
        "assistant" => Some("responding"),
        "user" => Some("running tools"),
        "result" => Some("finishing"),
        _ => None,
    }
}
