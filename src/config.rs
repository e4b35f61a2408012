//! Engine configuration for scout.
//!
//! Settings live in `.scout/config.yaml` under the repository root. A
//! missing file means defaults; a malformed one is a user error.
//!
//! # File Format
//!
//! ```yaml
//! backend: claude
//! timeout_seconds: 1200
//! verbose: true
//!
//! backends:
//!   claude:
//!     model: claude-sonnet-4-5
//!     extra_args: "--permission-mode acceptEdits"
//!     env:
//!       CLAUDE_CODE_MAX_OUTPUT_TOKENS: "64000"
//!   codex:
//!     model: gpt-5-codex
//! ```
//!
//! The `backends` map is keyed by the closed set of backend names; unknown
//! keys are rejected at load so a typo surfaces immediately instead of
//! silently running with defaults. Unknown fields elsewhere are preserved
//! for forward compatibility.

use crate::backend::Backend;
use crate::context::ScoutContext;
use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

/// Default per-execution timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 1200;

/// Backend used when the config file is absent or silent.
const DEFAULT_BACKEND: &str = "claude";

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Name of the backend to execute work items with.
    pub backend: String,

    /// Per-execution timeout in seconds.
    pub timeout_seconds: u64,

    /// Whether backends emit progress notifications.
    pub verbose: bool,

    /// Per-backend settings, keyed by backend name.
    #[serde(default)]
    pub backends: BTreeMap<String, BackendProfile>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            verbose: false,
            backends: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Settings for a single backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendProfile {
    /// Model name passed to the tool, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Additional command-line arguments, split with shell quoting rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_args: Option<String>,

    /// Credential injected via the backend's environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Extra environment variables for the tool process.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ScoutConfig {
    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist, and `Err` if it exists
    /// but cannot be parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::UserError(format!(
                "failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(Self::from_yaml(&content)?))
    }

    /// Load the repository's config, falling back to defaults when absent.
    pub fn load_or_default(ctx: &ScoutContext) -> Result<Self> {
        Ok(Self::load(ctx.config_file())?.unwrap_or_default())
    }

    /// Parse and validate config from a YAML string.
    ///
    /// An empty document means defaults, same as a missing file.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ScoutConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ScoutError::UserError(format!("failed to parse config.yaml: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ScoutError::UserError(format!("failed to serialize config: {}", e)))
    }

    /// Validate the configuration.
    ///
    /// Rules: the timeout must be positive, the selected backend and every
    /// `backends` key must name a known backend, and `extra_args` must split
    /// cleanly under shell quoting rules.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(ScoutError::UserError(
                "config validation failed: timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Backend::from_name(&self.backend)?;

        for (name, profile) in &self.backends {
            Backend::from_name(name).map_err(|_| {
                ScoutError::UserError(format!(
                    "config validation failed: unknown backend '{}' in backends map",
                    name
                ))
            })?;

            if let Some(extra_args) = &profile.extra_args {
                shell_words::split(extra_args).map_err(|e| {
                    ScoutError::UserError(format!(
                        "config validation failed: extra_args for '{}' does not parse: {}",
                        name, e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Settings for the named backend, defaults when not configured.
    pub fn profile(&self, name: &str) -> BackendProfile {
        self.backends.get(name).cloned().unwrap_or_default()
    }

    /// The backend selected by this config.
    pub fn selected_backend(&self) -> Result<Backend> {
        Backend::from_name(&self.backend)
    }

    /// The per-execution timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
