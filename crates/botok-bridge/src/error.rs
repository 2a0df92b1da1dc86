//! Error types for the Botok bridge.
//!
//! Failures are split into three kinds so a caller can tell "the tokenizer
//! produced no tokens" apart from "the tokenizer never ran" or "its output
//! was garbage":
//!
//! - [`LaunchError`] - the subprocess could not be started, timed out, or failed
//! - [`ProtocolError`] - the byte-line stream was malformed
//! - [`DecodeError`] - the payload bytes were not valid UTF-8

use std::path::PathBuf;
use thiserror::Error;

/// Result type for tokenizer operations.
pub type TokenizeResult<T> = Result<T, TokenizeError>;

/// The broad category of a [`TokenizeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Launch,
    Protocol,
    Decode,
}

impl ErrorKind {
    /// Returns the string identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Launch => "launch",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Decode => "decode",
        }
    }
}

/// Errors raised while locating, starting, or waiting on the tokenizer process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Interpreter could not be resolved.
    #[error("Interpreter '{name}' not found. Install Python or set BOTOK_INTERPRETER")]
    InterpreterNotFound { name: String },

    /// Tokenizer script does not exist.
    #[error("Tokenizer script not found at: {path}")]
    ScriptNotFound { path: PathBuf },

    /// The host has no active project to resolve the script against.
    #[error("No project is open; cannot resolve the tokenizer script")]
    NoProject,

    /// The OS refused to spawn the process.
    #[error("Failed to spawn tokenizer process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// The process did not finish before the deadline.
    #[error("Tokenizer process timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Reading the process output failed.
    #[error("Failed to read tokenizer output: {0}")]
    ReadOutput(#[source] std::io::Error),

    /// Waiting on the process failed.
    #[error("Failed to wait for tokenizer process: {0}")]
    WaitFailed(#[source] std::io::Error),

    /// The process exited with a non-zero status.
    #[error("Tokenizer process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },
}

impl LaunchError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }
}

/// Errors raised when the byte-line stream does not follow the protocol.
///
/// Line numbers are 1-based and count every line read, including the length line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The first line is not an integer.
    #[error("Invalid length line '{value}': expected a decimal byte count")]
    InvalidLength { value: String },

    /// The declared length is negative.
    #[error("Declared payload length is negative: {length}")]
    NegativeLength { length: i64 },

    /// The declared length exceeds the configured maximum.
    #[error("Declared payload length {length} exceeds the limit of {max} bytes")]
    LengthTooLarge { length: u64, max: usize },

    /// A byte line is not an integer.
    #[error("Line {line}: invalid byte value '{value}'")]
    InvalidByte { line: usize, value: String },

    /// A byte line is an integer outside [0, 255].
    #[error("Line {line}: byte value {value} is outside 0..=255")]
    ByteOutOfRange { line: usize, value: i64 },

    /// The stream ended before the declared number of bytes arrived.
    #[error("Stream ended after {received} of {expected} bytes")]
    Truncated { expected: usize, received: usize },
}

/// Errors raised when turning the completed byte buffer into text.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid UTF-8.
    #[error("Payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Any failure of a tokenizer call.
#[derive(Debug, Error)]
pub enum TokenizeError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<std::convert::Infallible> for TokenizeError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl TokenizeError {
    /// Returns the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenizeError::Launch(_) => ErrorKind::Launch,
            TokenizeError::Protocol(_) => ErrorKind::Protocol,
            TokenizeError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns a stable error code for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            TokenizeError::Launch(e) => match e {
                LaunchError::InterpreterNotFound { .. } => "BOTOK_LAUNCH_001",
                LaunchError::ScriptNotFound { .. } => "BOTOK_LAUNCH_002",
                LaunchError::NoProject => "BOTOK_LAUNCH_003",
                LaunchError::SpawnFailed(_) => "BOTOK_LAUNCH_004",
                LaunchError::Timeout { .. } => "BOTOK_LAUNCH_005",
                LaunchError::ReadOutput(_) => "BOTOK_LAUNCH_006",
                LaunchError::WaitFailed(_) => "BOTOK_LAUNCH_007",
                LaunchError::ProcessFailed { .. } => "BOTOK_LAUNCH_008",
            },
            TokenizeError::Protocol(e) => match e {
                ProtocolError::InvalidLength { .. } => "BOTOK_PROTOCOL_001",
                ProtocolError::NegativeLength { .. } => "BOTOK_PROTOCOL_002",
                ProtocolError::LengthTooLarge { .. } => "BOTOK_PROTOCOL_003",
                ProtocolError::InvalidByte { .. } => "BOTOK_PROTOCOL_004",
                ProtocolError::ByteOutOfRange { .. } => "BOTOK_PROTOCOL_005",
                ProtocolError::Truncated { .. } => "BOTOK_PROTOCOL_006",
            },
            TokenizeError::Decode(DecodeError::InvalidUtf8(_)) => "BOTOK_DECODE_001",
        }
    }
}
