//! Botok CLI - run the Botok tokenizer bridge from a terminal
//!
//! This binary drives the same provider a host application registers, which
//! makes it the quickest way to check a project's tokenizer script.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Botok - Tibetan tokenizer bridge
#[derive(Parser)]
#[command(name = "botok")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize text with the project's Botok script
    Tokenize {
        /// Text to tokenize
        text: String,

        /// Project root holding the tokenizer script (default: current directory)
        #[arg(short, long, default_value = ".")]
        project_root: String,

        /// JSON config file for the launcher
        #[arg(short, long)]
        config: Option<String>,

        /// Interpreter to run the script with (default: python3, then python)
        #[arg(long)]
        interpreter: Option<String>,

        /// Script path, relative to the project root
        #[arg(long)]
        script: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },

    /// Decode a captured script output stream
    Decode {
        /// File holding the stream (default: stdin)
        #[arg(short, long)]
        input: Option<String>,

        /// Output a machine-readable JSON report
        #[arg(long)]
        json: bool,
    },

    /// Print text in the script output format
    Encode {
        /// Text to encode
        text: String,
    },

    /// List the providers registered with the host
    Providers {
        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Tokenize {
            text,
            project_root,
            config,
            interpreter,
            script,
            timeout_secs,
            json,
        } => commands::tokenize::run(
            &text,
            &commands::tokenize::TokenizeOptions {
                project_root: &project_root,
                config: config.as_deref(),
                interpreter: interpreter.as_deref(),
                script: script.as_deref(),
                timeout_secs,
                json,
            },
        ),
        Commands::Decode { input, json } => commands::decode::run(input.as_deref(), json),
        Commands::Encode { text } => commands::encode::run(&text),
        Commands::Providers { json } => commands::providers::run(json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_tokenize() {
        let cli = Cli::try_parse_from([
            "botok",
            "tokenize",
            "བཀྲ་ཤིས་བདེ་ལེགས།",
            "--project-root",
            "/projects/dharma",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Tokenize {
                text,
                project_root,
                timeout_secs,
                json,
                config,
                ..
            } => {
                assert_eq!(text, "བཀྲ་ཤིས་བདེ་ལེགས།");
                assert_eq!(project_root, "/projects/dharma");
                assert_eq!(timeout_secs, Some(5));
                assert!(!json);
                assert!(config.is_none());
            }
            _ => panic!("expected tokenize command"),
        }
    }

    #[test]
    fn test_cli_tokenize_defaults_project_root() {
        let cli = Cli::try_parse_from(["botok", "tokenize", "ཀ"]).unwrap();
        match cli.command {
            Commands::Tokenize { project_root, .. } => assert_eq!(project_root, "."),
            _ => panic!("expected tokenize command"),
        }
    }

    #[test]
    fn test_cli_requires_text() {
        assert!(Cli::try_parse_from(["botok", "tokenize"]).is_err());
        assert!(Cli::try_parse_from(["botok", "encode"]).is_err());
    }

    #[test]
    fn test_cli_parses_decode() {
        let cli = Cli::try_parse_from(["botok", "decode", "--input", "out.txt", "--json"]).unwrap();
        match cli.command {
            Commands::Decode { input, json } => {
                assert_eq!(input.as_deref(), Some("out.txt"));
                assert!(json);
            }
            _ => panic!("expected decode command"),
        }
    }

    #[test]
    fn test_cli_verbose_is_global() {
        let cli = Cli::try_parse_from(["botok", "providers", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
