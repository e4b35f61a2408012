//! Scout: execution and steering engine for autonomous coding-agent loops.
//!
//! The crate has two load-bearing subsystems:
//!
//! - An **execution-backend harness** ([`harness`], [`backend`]) that drives
//!   external LLM command-line tools (claude, codex, gemini) inside isolated
//!   working copies: spawn, stream output, enforce a timeout, and report a
//!   uniform [`backend::ExecutionResult`] regardless of which tool ran.
//! - A **hint/directive store** ([`hints`]) through which a short-lived
//!   operator command (`nudge`) steers the long-running autonomous loop:
//!   durable per-repository state with append ordering and consume-once
//!   delivery.
//!
//! The autonomous loop itself is a consumer of this library, not part of it.
//! It reads pending hints once per cycle via [`hints::take_pending`] and
//! invokes [`backend::Backend::run`] to execute work items:
//!
//! ```no_run
//! use scout::backend::ExecutionRequest;
//! use scout::config::ScoutConfig;
//! use scout::context::ScoutContext;
//! use scout::hints;
//!
//! let ctx = ScoutContext::resolve()?;
//! let config = ScoutConfig::load_or_default(&ctx)?;
//!
//! // Steering input first, then the work item.
//! for hint in hints::take_pending(&ctx)? {
//!     println!("operator says: {}", hint.text);
//! }
//!
//! let backend = config.selected_backend()?;
//! let mut archive = |chunk: &str| {
//!     let _ = chunk; // append to the run log
//! };
//! let mut progress = |phase: &str| eprintln!("[{}]", phase);
//! let result = backend.run(
//!     &config,
//!     ExecutionRequest {
//!         working_copy: &ctx.repo_root,
//!         prompt: "implement the selected work item",
//!         timeout: config.timeout(),
//!         verbose: config.verbose,
//!         on_progress: &mut progress,
//!         on_raw: &mut archive,
//!     },
//! );
//! if !result.success {
//!     eprintln!("{}", result.failure.unwrap().message);
//! }
//! # Ok::<(), scout::error::ScoutError>(())
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod git;
pub mod harness;
pub mod hints;

#[cfg(test)]
pub(crate) mod test_support;
