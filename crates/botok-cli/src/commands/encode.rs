//! Encode command implementation

use anyhow::Result;
use botok_bridge::encode_payload;
use std::process::ExitCode;

/// Prints `text` in the script output format, one line per value.
pub fn run(text: &str) -> Result<ExitCode> {
    for line in encode_payload(text) {
        println!("{}", line);
    }
    Ok(ExitCode::SUCCESS)
}
