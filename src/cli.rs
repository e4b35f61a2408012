//! CLI argument parsing for nudge.
//!
//! Uses clap derive macros for declarative argument definitions. Intents are
//! mutually exclusive: free-text hint (the positional tokens), `--list`,
//! `--clear`, or one of the three drill directives. Dispatch lives in the
//! `commands` module.

use clap::{ArgGroup, Parser};

/// Nudge: steer the running scout loop.
///
/// With free-text arguments, records a hint the loop picks up at the start
/// of its next cycle. The flags instead list pending input, clear it, or
/// record a drill-mode directive.
#[derive(Parser, Debug)]
#[command(name = "nudge")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("intent")
        .args(["list", "clear", "drill_pause", "drill_resume", "drill_disable"])
        .multiple(false)
))]
pub struct NudgeCli {
    /// Free-text hint for the next scout cycle (tokens are joined with spaces).
    #[arg(conflicts_with = "intent")]
    pub text: Vec<String>,

    /// List pending hints and directives.
    #[arg(long)]
    pub list: bool,

    /// Remove all pending hints and directives.
    #[arg(long)]
    pub clear: bool,

    /// Pause drill mode after the current cycle.
    #[arg(long)]
    pub drill_pause: bool,

    /// Resume a paused drill mode.
    #[arg(long)]
    pub drill_resume: bool,

    /// Disable drill mode entirely.
    #[arg(long)]
    pub drill_disable: bool,
}

impl NudgeCli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        NudgeCli::parse()
    }

    /// The positional tokens joined into one hint text.
    pub fn hint_text(&self) -> String {
        self.text.join(" ")
    }
}
