//! Execution backends for external coding agents.
//!
//! A backend turns one [`ExecutionRequest`] into one [`ExecutionResult`] by
//! driving its agent CLI through the process harness. The variant set is a
//! closed enum: new tools are added deliberately by adding a variant, not
//! discovered at runtime. Variants differ only in how the command line is
//! derived from configuration, which environment variable carries the
//! credential, and whether a coarse progress phase can be read off the
//! tool's output; the lifecycle is identical for all of them.
//!
//! A backend never retries and never raises process failures: spawn errors,
//! nonzero exits, and timeouts all come back inside the result, tagged with
//! the backend name, so the calling loop owns retry policy. Timeouts are
//! classified separately from ordinary failures because callers back off
//! differently for them.

use crate::config::ScoutConfig;
use crate::error::{Result, ScoutError};
use crate::harness::{self, HarnessRequest, StreamSource};
use std::path::Path;
use std::time::{Duration, Instant};

mod claude;
mod codex;
mod gemini;

/// Longest notification forwarded to the progress callback, in characters
/// of the trimmed chunk.
const PROGRESS_PREFIX_CHARS: usize = 160;

/// Marker prepended to stderr chunks on the raw-output channel.
const STDERR_MARKER: &str = "[stderr] ";

/// The supported external agent tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Claude Code CLI (`claude`), stream-json output.
    Claude,
    /// Codex CLI (`codex exec`), plain text with section headers.
    Codex,
    /// Gemini CLI (`gemini`), plain text.
    Gemini,
}

impl Backend {
    /// Every supported backend.
    pub const ALL: [Backend; 3] = [Backend::Claude, Backend::Codex, Backend::Gemini];

    /// Stable identifier, used in config and failure messages.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Claude => "claude",
            Backend::Codex => "codex",
            Backend::Gemini => "gemini",
        }
    }

    /// Resolve a backend by name.
    pub fn from_name(name: &str) -> Result<Backend> {
        match name {
            "claude" => Ok(Backend::Claude),
            "codex" => Ok(Backend::Codex),
            "gemini" => Ok(Backend::Gemini),
            other => Err(ScoutError::UserError(format!(
                "unknown backend '{}' (expected claude, codex, or gemini)",
                other
            ))),
        }
    }

    /// Execute one request to completion.
    ///
    /// Blocks until the agent process exits, times out, or fails to spawn.
    /// Exactly one result is produced per call.
    pub fn run(&self, config: &ScoutConfig, req: ExecutionRequest<'_>) -> ExecutionResult {
        let plan = match self {
            Backend::Claude => claude::plan(config),
            Backend::Codex => codex::plan(config),
            Backend::Gemini => gemini::plan(config),
        };

        let plan = match plan {
            Ok(plan) => plan,
            Err(message) => {
                return ExecutionResult::failed(
                    self.name(),
                    FailureKind::Failed,
                    &message,
                    String::new(),
                    Duration::ZERO,
                );
            }
        };

        let phase_for = match self {
            Backend::Claude => claude::phase,
            Backend::Codex => codex::phase,
            Backend::Gemini => gemini::phase,
        };

        execute(self.name(), &plan, phase_for, req)
    }
}

/// Command line and environment for one backend invocation.
#[derive(Debug, Clone)]
pub(crate) struct CommandPlan {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(String, String)>,
}

/// One unit of agent work.
pub struct ExecutionRequest<'a> {
    /// Working copy the agent runs in.
    pub working_copy: &'a Path,
    /// Prompt payload, delivered on the tool's stdin.
    pub prompt: &'a str,
    /// Wall-clock limit for the run.
    pub timeout: Duration,
    /// Whether to emit progress notifications.
    pub verbose: bool,
    /// Receives coarse progress notifications (verbose mode only).
    pub on_progress: &'a mut dyn FnMut(&str),
    /// Receives every raw output chunk, unconditionally, for archival.
    pub on_raw: &'a mut dyn FnMut(&str),
}

/// How an execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Spawn failure or nonzero exit.
    Failed,
    /// The timeout elapsed and the process was terminated.
    TimedOut,
}

/// Failure details, message tagged with the backend name.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one backend execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the agent exited cleanly within the timeout.
    pub success: bool,
    /// Captured primary output (the tool's stdout).
    pub output: String,
    /// Present iff `success` is false.
    pub failure: Option<ExecutionFailure>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Whether this failure was a timeout.
    pub fn timed_out(&self) -> bool {
        matches!(&self.failure, Some(f) if f.kind == FailureKind::TimedOut)
    }

    fn succeeded(output: String, duration: Duration) -> Self {
        Self {
            success: true,
            output,
            failure: None,
            duration,
        }
    }

    fn failed(
        backend: &str,
        kind: FailureKind,
        message: &str,
        output: String,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            output,
            failure: Some(ExecutionFailure {
                kind,
                message: format!("{}: {}", backend, message),
            }),
            duration,
        }
    }
}

/// Shared lifecycle: run the plan through the harness, fan chunks out to the
/// callbacks, and fold the outcome into an `ExecutionResult`.
fn execute(
    name: &'static str,
    plan: &CommandPlan,
    phase_for: fn(&str) -> Option<&'static str>,
    req: ExecutionRequest<'_>,
) -> ExecutionResult {
    let ExecutionRequest {
        working_copy,
        prompt,
        timeout,
        verbose,
        on_progress,
        on_raw,
    } = req;

    let harness_req = HarnessRequest {
        program: &plan.program,
        args: &plan.args,
        cwd: working_copy,
        env: &plan.env,
        stdin: Some(prompt),
        timeout,
    };

    let started = Instant::now();
    let mut output = String::new();
    let outcome = {
        let mut on_chunk = |source: StreamSource, chunk: &str| match source {
            StreamSource::Stdout => {
                output.push_str(chunk);
                on_raw(chunk);
                if verbose {
                    let trimmed = chunk.trim();
                    if !trimmed.is_empty() {
                        match phase_for(trimmed) {
                            Some(phase) => on_progress(phase),
                            None => on_progress(&progress_prefix(trimmed)),
                        }
                    }
                }
            }
            StreamSource::Stderr => {
                on_raw(&format!("{}{}", STDERR_MARKER, chunk));
            }
        };
        harness::run(&harness_req, &mut on_chunk)
    };

    match outcome {
        Ok(o) if o.is_success() => ExecutionResult::succeeded(output, o.duration),
        Ok(o) if o.timed_out => ExecutionResult::failed(
            name,
            FailureKind::TimedOut,
            &format!("timed out after {}s", timeout.as_secs()),
            output,
            o.duration,
        ),
        Ok(o) => {
            let message = match o.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            };
            ExecutionResult::failed(name, FailureKind::Failed, &message, output, o.duration)
        }
        Err(e) => ExecutionResult::failed(
            name,
            FailureKind::Failed,
            &e.to_string(),
            output,
            started.elapsed(),
        ),
    }
}

/// Bounded prefix of the trimmed text for progress notifications.
fn progress_prefix(text: &str) -> String {
    text.chars().take(PROGRESS_PREFIX_CHARS).collect()
}

/// Split a profile's `extra_args` under shell quoting rules.
fn split_extra_args(extra_args: &Option<String>) -> std::result::Result<Vec<String>, String> {
    match extra_args {
        Some(raw) => shell_words::split(raw)
            .map_err(|e| format!("extra_args does not parse: {}", e)),
        None => Ok(Vec::new()),
    }
}

/// Profile env map as an override list, in stable order.
fn profile_env(env: &std::collections::HashMap<String, String>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = env
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    pairs.sort();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_phase(_chunk: &str) -> Option<&'static str> {
        None
    }

    fn always_working(_chunk: &str) -> Option<&'static str> {
        Some("working")
    }

    struct Recorded {
        progress: Vec<String>,
        raw: Vec<String>,
    }

    fn run_plan(
        plan: &CommandPlan,
        phase_for: fn(&str) -> Option<&'static str>,
        verbose: bool,
        timeout: Duration,
    ) -> (ExecutionResult, Recorded) {
        let temp_dir = TempDir::new().unwrap();
        let mut progress = Vec::new();
        let mut raw = Vec::new();

        let result = execute(
            "claude",
            plan,
            phase_for,
            ExecutionRequest {
                working_copy: temp_dir.path(),
                prompt: "do the work",
                timeout,
                verbose,
                on_progress: &mut |p| progress.push(p.to_string()),
                on_raw: &mut |c| raw.push(c.to_string()),
            },
        );

        (result, Recorded { progress, raw })
    }

    #[cfg(unix)]
    fn shell_plan(script: &str) -> CommandPlan {
        CommandPlan {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: Vec::new(),
        }
    }

    #[test]
    fn from_name_resolves_every_backend() {
        for backend in Backend::ALL {
            assert_eq!(Backend::from_name(backend.name()).unwrap(), backend);
        }
    }

    #[test]
    fn from_name_rejects_unknown_tools() {
        let err = Backend::from_name("copilot").unwrap_err();
        assert!(matches!(err, ScoutError::UserError(_)));
        assert!(err.to_string().contains("copilot"));
    }

    #[test]
    fn spawn_failure_is_captured_and_tagged() {
        let plan = CommandPlan {
            program: "scout-no-such-tool-xyz".to_string(),
            args: Vec::new(),
            env: Vec::new(),
        };

        let (result, _) = run_plan(&plan, no_phase, false, Duration::from_secs(1));

        assert!(!result.success);
        assert!(!result.timed_out());
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Failed);
        assert!(failure.message.starts_with("claude: "));
        assert!(failure.message.contains("spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn success_captures_stdout_as_output() {
        let (result, recorded) = run_plan(
            &shell_plan("echo agent-output"),
            no_phase,
            false,
            Duration::from_secs(10),
        );

        assert!(result.success);
        assert!(result.failure.is_none());
        assert!(result.output.contains("agent-output"));
        assert!(recorded.raw.iter().any(|c| c.contains("agent-output")));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_tagged_by_backend_name() {
        let (result, _) = run_plan(&shell_plan("exit 7"), no_phase, false, Duration::from_secs(10));

        assert!(!result.success);
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Failed);
        assert_eq!(failure.message, "claude: exited with code 7");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_is_classified_distinctly_from_failure() {
        let (result, _) = run_plan(
            &shell_plan("sleep 10"),
            no_phase,
            false,
            Duration::from_millis(200),
        );

        assert!(!result.success);
        assert!(result.timed_out());
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::TimedOut);
        assert!(failure.message.starts_with("claude: timed out after"));
    }

    #[cfg(unix)]
    #[test]
    fn stderr_reaches_raw_channel_with_marker() {
        let (result, recorded) = run_plan(
            &shell_plan("echo boom 1>&2"),
            no_phase,
            false,
            Duration::from_secs(10),
        );

        assert!(result.success);
        assert!(
            recorded
                .raw
                .iter()
                .any(|c| c.starts_with(STDERR_MARKER) && c.contains("boom"))
        );
        // Stderr is not part of the primary output.
        assert!(!result.output.contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn progress_is_silent_unless_verbose() {
        let (_, recorded) = run_plan(
            &shell_plan("echo chatter"),
            no_phase,
            false,
            Duration::from_secs(10),
        );
        assert!(recorded.progress.is_empty());

        let (_, recorded) = run_plan(
            &shell_plan("echo chatter"),
            no_phase,
            true,
            Duration::from_secs(10),
        );
        assert!(recorded.progress.iter().any(|p| p.contains("chatter")));
    }

    #[cfg(unix)]
    #[test]
    fn progress_prefers_the_derived_phase() {
        let (_, recorded) = run_plan(
            &shell_plan("echo anything"),
            always_working,
            true,
            Duration::from_secs(10),
        );
        assert!(recorded.progress.contains(&"working".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn progress_notifications_are_truncated() {
        let long_line = "x".repeat(4000);
        let (_, recorded) = run_plan(
            &shell_plan(&format!("echo {}", long_line)),
            no_phase,
            true,
            Duration::from_secs(10),
        );

        assert!(!recorded.progress.is_empty());
        for p in &recorded.progress {
            assert!(p.chars().count() <= PROGRESS_PREFIX_CHARS);
        }
        // Raw output is never truncated.
        let raw_total: usize = recorded.raw.iter().map(|c| c.len()).sum();
        assert!(raw_total >= 4000);
    }

    #[test]
    fn progress_prefix_respects_char_boundaries() {
        let text = "é".repeat(PROGRESS_PREFIX_CHARS + 50);
        let prefix = progress_prefix(&text);
        assert_eq!(prefix.chars().count(), PROGRESS_PREFIX_CHARS);
    }

    #[test]
    fn split_extra_args_handles_quoting() {
        let args = split_extra_args(&Some("--flag \"two words\"".to_string())).unwrap();
        assert_eq!(args, vec!["--flag", "two words"]);

        assert!(split_extra_args(&None).unwrap().is_empty());
        assert!(split_extra_args(&Some("\"unclosed".to_string())).is_err());
    }

    #[test]
    fn profile_env_is_stable_and_complete() {
        let mut env = std::collections::HashMap::new();
        env.insert("B".to_string(), "2".to_string());
        env.insert("A".to_string(), "1".to_string());

        let pairs = profile_env(&env);
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string())
            ]
        );
    }
}
