//! Decode command implementation
//!
//! Decodes a captured script output stream, for checking a script by hand:
//! `python temp.py "text" | botok decode`.

use anyhow::{Context, Result};
use botok_bridge::decode_reader;
use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;

use super::reporting::print_result;

/// Run the decode command
///
/// # Arguments
/// * `input` - File holding the stream (default: stdin)
/// * `json` - Emit a JSON report
pub fn run(input: Option<&str>, json: bool) -> Result<ExitCode> {
    let result = match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path))?;
            decode_reader(BufReader::new(file))
        }
        None => decode_reader(io::stdin().lock()),
    };

    if print_result(&result, json)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
