//! Codex backend.
//!
//! Runs `codex exec` with the prompt on stdin (the trailing `-` argument).
//! Output is plain text, but codex prints bracketed section headers between
//! blocks (`[ts] thinking`, `[ts] exec ...`, `[ts] codex`), which is enough
//! to derive coarse progress phases.

use super::{CommandPlan, split_extra_args, profile_env};
use crate::config::ScoutConfig;
use regex::Regex;
use std::sync::LazyLock;

/// Environment variable carrying the credential for this backend family.
const API_KEY_VAR: &str = "OPENAI_API_KEY";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\[[^\]]*\]\s+(thinking|exec|codex|tokens used)").unwrap()
});

pub(super) fn plan(config: &ScoutConfig) -> Result<CommandPlan, String> {
    let profile = config.profile("codex");

    let mut args = vec!["exec".to_string(), "--skip-git-repo-check".to_string()];
    if let Some(model) = &profile.model {
        args.push("--model".to_string());
        args.push(model.clone());
    }
    args.extend(split_extra_args(&profile.extra_args)?);
    // Trailing "-" makes codex read the prompt from stdin.
    args.push("-".to_string());

    let mut env = profile_env(&profile.env);
    if let Some(key) = &profile.api_key {
        env.push((API_KEY_VAR.to_string(), key.clone()));
    }

    Ok(CommandPlan {
        program: "codex".to_string(),
        args,
        env,
    })
}

/// Coarse phase from a section header, if the chunk starts one.
pub(super) fn phase(chunk: &str) -> Option<&'static str> {
    let caps = HEADER_RE.captures(chunk)?;
    match caps.get(1)?.as_str() {
        "thinking" => Some("thinking"),
        "exec" => Some("running commands"),
        "codex" => Some("responding"),
        "tokens used" => Some("finishing"),
        _ => None,
    }
}
