//! Shared output helpers for command results.

use botok_bridge::TokenizeError;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ErrorReport {
    pub code: &'static str,
    pub kind: &'static str,
    pub message: String,
}

impl From<&TokenizeError> for ErrorReport {
    fn from(err: &TokenizeError) -> Self {
        Self {
            code: err.code(),
            kind: err.kind().as_str(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl CommandReport {
    pub fn from_result(result: &Result<String, TokenizeError>) -> Self {
        match result {
            Ok(output) => Self {
                ok: true,
                output: Some(output.clone()),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                output: None,
                error: Some(ErrorReport::from(e)),
            },
        }
    }
}

/// Prints a tokenizer result, returning true on success.
pub(crate) fn print_result(result: &Result<String, TokenizeError>, json: bool) -> anyhow::Result<bool> {
    if json {
        let report = CommandReport::from_result(result);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report.ok);
    }

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} [{}] {}", "error".red().bold(), e.code(), e);
            Ok(false)
        }
    }
}
