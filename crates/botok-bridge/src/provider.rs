//! Translation provider interface and the Botok tokenizer provider.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::LauncherConfig;
use crate::error::{LaunchError, TokenizeResult};
use crate::launcher::Launcher;

/// Display name the host shows for the Botok provider.
pub const BOTOK_NAME: &str = "Botok Tokenizer";

/// Preference key the host stores the provider's settings under.
pub const BOTOK_PREFERENCE_KEY: &str = "botok_tokenizer";

/// A host language code, e.g. `bo` or `en-US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access to the host's active project.
pub trait ProjectContext: Send + Sync {
    /// Root directory of the open project, if any.
    fn project_root(&self) -> Option<PathBuf>;
}

/// A project context pinned to one directory.
#[derive(Debug, Clone)]
pub struct FixedProject(pub PathBuf);

impl ProjectContext for FixedProject {
    fn project_root(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// A capability the host calls to transform a source segment.
pub trait TranslationProvider: Send + Sync {
    /// Name shown in the host UI.
    fn name(&self) -> &str;

    /// Key under which the host persists this provider's preferences.
    fn preference_key(&self) -> &str;

    fn translate(&self, source: &Language, target: &Language, text: &str)
        -> TokenizeResult<String>;

    fn is_configurable(&self) -> bool {
        false
    }

    /// Opens the provider's settings. Does nothing by default.
    fn show_configuration_ui(&self) {}
}

impl fmt::Debug for dyn TranslationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Runs the project's Botok script on each segment.
///
/// The script is resolved against the project root on every call, so
/// switching projects in the host picks up the new project's script.
pub struct BotokTokenizer {
    context: Arc<dyn ProjectContext>,
    launcher: Launcher,
}

impl BotokTokenizer {
    pub fn new(context: Arc<dyn ProjectContext>, config: LauncherConfig) -> Self {
        Self {
            context,
            launcher: Launcher::with_config(config),
        }
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// Tokenizes `text` with the project's script.
    pub fn tokenize(&self, text: &str) -> TokenizeResult<String> {
        let root = self.context.project_root().ok_or(LaunchError::NoProject)?;
        let script = self.launcher.config().script_path(&root);
        let request = self.launcher.request(script, text)?;
        self.launcher.run(&request)
    }
}

impl TranslationProvider for BotokTokenizer {
    fn name(&self) -> &str {
        BOTOK_NAME
    }

    fn preference_key(&self) -> &str {
        BOTOK_PREFERENCE_KEY
    }

    fn translate(
        &self,
        _source: &Language,
        _target: &Language,
        text: &str,
    ) -> TokenizeResult<String> {
        self.tokenize(text)
    }

    fn is_configurable(&self) -> bool {
        true
    }
}
