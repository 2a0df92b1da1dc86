//! Tokenize command implementation
//!
//! Runs the project's Botok script on one piece of text through the same
//! provider the host uses.

use anyhow::{Context, Result};
use botok_bridge::{
    register_plugins, FixedProject, Language, LauncherConfig, ProviderRegistry, BOTOK_NAME,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use super::reporting::print_result;

/// Options for the tokenize command.
#[derive(Debug, Default)]
pub struct TokenizeOptions<'a> {
    pub project_root: &'a str,
    pub config: Option<&'a str>,
    pub interpreter: Option<&'a str>,
    pub script: Option<&'a str>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

/// Builds the launcher config: file (or defaults), then environment, then flags.
pub(crate) fn build_config(opts: &TokenizeOptions<'_>) -> Result<LauncherConfig> {
    let mut config = match opts.config {
        Some(path) => LauncherConfig::from_json_file(Path::new(path))
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => LauncherConfig::default(),
    }
    .with_env_overrides();

    if let Some(interpreter) = opts.interpreter {
        config = config.interpreter(interpreter);
    }
    if let Some(script) = opts.script {
        config = config.script(script);
    }
    if let Some(secs) = opts.timeout_secs {
        config = config.timeout_secs(secs);
    }

    Ok(config)
}

/// Run the tokenize command
///
/// # Returns
/// Exit code: 0 success, 1 tokenizer failure
pub fn run(text: &str, opts: &TokenizeOptions<'_>) -> Result<ExitCode> {
    let config = build_config(opts)?;
    tracing::debug!(?config, project_root = opts.project_root, "tokenize");

    let mut registry = ProviderRegistry::new();
    let project = Arc::new(FixedProject(PathBuf::from(opts.project_root)));
    register_plugins(&mut registry, project, config)?;

    let provider = registry
        .get(BOTOK_NAME)
        .with_context(|| format!("Provider '{}' is not registered", BOTOK_NAME))?;

    // The Botok provider ignores the language pair.
    let source = Language::new("bo");
    let target = Language::new("bo");
    let result = provider.translate(&source, &target, text);

    if print_result(&result, opts.json)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("botok.json");
        std::fs::write(&path, r#"{ "script": "scripts/a.py", "timeout_ms": 1000 }"#).unwrap();
        let path = path.to_str().unwrap().to_string();

        let opts = TokenizeOptions {
            project_root: ".",
            config: Some(path.as_str()),
            script: Some("scripts/b.py"),
            timeout_secs: Some(4),
            ..Default::default()
        };
        let config = build_config(&opts).unwrap();
        assert_eq!(config.script, PathBuf::from("scripts/b.py"));
        assert_eq!(config.timeout_ms, 4000);
    }

    #[test]
    fn test_build_config_missing_file() {
        let opts = TokenizeOptions {
            project_root: ".",
            config: Some("/nonexistent/botok.json"),
            ..Default::default()
        };
        let err = build_config(&opts).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
