//! Gemini CLI backend.
//!
//! The simplest variant: plain text output read from stdin-delivered
//! prompts, no machine-readable stream and no derivable phases.

use super::{CommandPlan, split_extra_args, profile_env};
use crate::config::ScoutConfig;

/// Environment variable carrying the credential for this backend family.
const API_KEY_VAR: &str = "GEMINI_API_KEY";

pub(super) fn plan(config: &ScoutConfig) -> Result<CommandPlan, String> {
    let profile = config.profile("gemini");

    let mut args = Vec::new();
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
        program: "gemini".to_string(),
        args,
        env,
    })
}

/// Gemini output carries no phase structure.
pub(super) fn phase(_chunk: &str) -> Option<&'static str> {
    None
}
