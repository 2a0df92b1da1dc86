//! Providers command implementation
//!
//! Lists the providers this build registers with a host.

use anyhow::Result;
use botok_bridge::{register_plugins, FixedProject, LauncherConfig, ProviderRegistry};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ProviderInfo {
    pub name: String,
    pub preference_key: String,
    pub configurable: bool,
}

pub(crate) fn collect() -> Result<Vec<ProviderInfo>> {
    let mut registry = ProviderRegistry::new();
    let project = Arc::new(FixedProject(PathBuf::from(".")));
    register_plugins(&mut registry, project, LauncherConfig::default())?;

    Ok(registry
        .list()
        .into_iter()
        .map(|p| ProviderInfo {
            name: p.name().to_string(),
            preference_key: p.preference_key().to_string(),
            configurable: p.is_configurable(),
        })
        .collect())
}

/// Run the providers command
pub fn run(json: bool) -> Result<ExitCode> {
    let providers = collect()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(ExitCode::SUCCESS);
    }

    for p in &providers {
        println!("{} ({})", p.name.cyan().bold(), p.preference_key);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collect() {
        let providers = collect().unwrap();
        assert_eq!(
            providers,
            vec![ProviderInfo {
                name: "Botok Tokenizer".to_string(),
                preference_key: "botok_tokenizer".to_string(),
                configurable: true,
            }]
        );
    }
}
