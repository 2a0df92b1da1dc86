//! Launcher configuration.
//!
//! Configuration is layered: built-in defaults, then an optional JSON file,
//! then environment variables (`BOTOK_INTERPRETER`, `BOTOK_TIMEOUT_SECS`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::error::LaunchError;

/// Default timeout for a tokenizer call (30 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default script location, relative to the project root.
pub const DEFAULT_SCRIPT: &str = "pythonScripts/temp.py";

/// Default upper bound on a declared payload length (16 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Environment variable naming the interpreter.
pub const INTERPRETER_ENV: &str = "BOTOK_INTERPRETER";

/// Environment variable overriding the timeout, in seconds.
pub const TIMEOUT_ENV: &str = "BOTOK_TIMEOUT_SECS";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for the tokenizer launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Interpreter executable (name or path). Searched in PATH when unset.
    pub interpreter: Option<PathBuf>,
    /// Script path. Relative paths are resolved against the project root.
    pub script: PathBuf,
    /// Deadline for the whole call, in milliseconds.
    pub timeout_ms: u64,
    /// Whether to capture the script's stderr for error reports.
    pub capture_stderr: bool,
    /// Largest payload length the decoder will accept.
    pub max_payload_bytes: usize,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            script: PathBuf::from(DEFAULT_SCRIPT),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            capture_stderr: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl LauncherConfig {
    /// Loads a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `BOTOK_INTERPRETER` and `BOTOK_TIMEOUT_SECS` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(
            std::env::var(INTERPRETER_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn apply_overrides(mut self, interpreter: Option<String>, timeout_secs: Option<String>) -> Self {
        if let Some(interpreter) = interpreter.filter(|s| !s.trim().is_empty()) {
            self.interpreter = Some(PathBuf::from(interpreter));
        }
        if let Some(raw) = timeout_secs {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.timeout_ms = secs.saturating_mul(1000),
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable {}", TIMEOUT_ENV),
            }
        }
        self
    }

    /// Sets the interpreter.
    pub fn interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Sets the script path.
    pub fn script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = script.into();
        self
    }

    /// Sets the timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_ms = secs.saturating_mul(1000);
        self
    }

    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    pub fn max_payload_bytes(mut self, max: usize) -> Self {
        self.max_payload_bytes = max;
        self
    }

    /// Returns the timeout as a [`Duration`].
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolves the script path against a project root.
    pub fn script_path(&self, project_root: &Path) -> PathBuf {
        if self.script.is_absolute() {
            self.script.clone()
        } else {
            project_root.join(&self.script)
        }
    }

    /// Finds the interpreter executable.
    ///
    /// An explicitly configured interpreter must resolve; otherwise `python3`
    /// and then `python` are looked up in PATH.
    pub fn resolve_interpreter(&self) -> Result<PathBuf, LaunchError> {
        if let Some(ref interpreter) = self.interpreter {
            return which::which(interpreter).map_err(|_| LaunchError::InterpreterNotFound {
                name: interpreter.display().to_string(),
            });
        }

        let candidates = if cfg!(windows) {
            vec!["python3.exe", "python.exe", "py.exe"]
        } else {
            vec!["python3", "python"]
        };

        for name in candidates {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        Err(LaunchError::InterpreterNotFound {
            name: "python".to_string(),
        })
    }
}
