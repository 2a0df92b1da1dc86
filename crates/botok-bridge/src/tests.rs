//! Tests for provider registration.

use super::*;
use std::path::PathBuf;

struct EchoProvider {
    name: &'static str,
    key: &'static str,
}

impl TranslationProvider for EchoProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn preference_key(&self) -> &str {
        self.key
    }

    fn translate(&self, _: &Language, _: &Language, text: &str) -> TokenizeResult<String> {
        Ok(text.to_uppercase())
    }
}

struct NoProject;

impl ProjectContext for NoProject {
    fn project_root(&self) -> Option<PathBuf> {
        None
    }
}

fn echo(name: &'static str, key: &'static str) -> Arc<dyn TranslationProvider> {
    Arc::new(EchoProvider { name, key })
}

fn langs() -> (Language, Language) {
    (Language::new("bo"), Language::new("en"))
}

// ============================================================================
// Registry Tests
// ============================================================================

#[test]
fn test_registry_new() {
    let registry = ProviderRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_register_plugins() {
    let mut registry = ProviderRegistry::new();
    let project = Arc::new(FixedProject(PathBuf::from("/tmp/project")));
    register_plugins(&mut registry, project, LauncherConfig::default()).unwrap();

    assert_eq!(registry.len(), 1);
    let provider = registry.get("Botok Tokenizer").unwrap();
    assert_eq!(provider.preference_key(), "botok_tokenizer");
    assert!(provider.is_configurable());
    provider.show_configuration_ui();

    let by_key = registry.get_by_preference("botok_tokenizer").unwrap();
    assert_eq!(by_key.name(), BOTOK_NAME);
}

#[test]
fn test_register_plugins_twice() {
    let mut registry = ProviderRegistry::new();
    let project: Arc<dyn ProjectContext> = Arc::new(FixedProject(PathBuf::from("/tmp/project")));
    register_plugins(&mut registry, project.clone(), LauncherConfig::default()).unwrap();

    let err = register_plugins(&mut registry, project, LauncherConfig::default()).unwrap_err();
    assert_eq!(err, RegistryError::AlreadyRegistered(BOTOK_NAME.to_string()));
}

#[test]
fn test_registry_preference_conflict() {
    let mut registry = ProviderRegistry::new();
    registry.register(echo("Echo", "echo")).unwrap();

    let err = registry.register(echo("Echo Two", "echo")).unwrap_err();
    assert_eq!(
        err,
        RegistryError::PreferenceKeyConflict {
            key: "echo".to_string(),
            existing: "Echo".to_string(),
        }
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registry_rejects_empty_identifiers() {
    let mut registry = ProviderRegistry::new();
    assert!(matches!(
        registry.register(echo("", "echo")),
        Err(RegistryError::InvalidProvider(_))
    ));
    assert!(matches!(
        registry.register(echo("Echo", " ")),
        Err(RegistryError::InvalidProvider(_))
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_registry_list_sorted() {
    let mut registry = ProviderRegistry::new();
    registry.register(echo("Zeta", "zeta")).unwrap();
    registry.register(echo("Alpha", "alpha")).unwrap();

    let names: Vec<&str> = registry.list().into_iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);
}

#[test]
fn test_registry_unregister() {
    let mut registry = ProviderRegistry::new();
    registry.register(echo("Echo", "echo")).unwrap();

    let removed = registry.unregister("Echo").unwrap();
    assert_eq!(removed.name(), "Echo");
    assert!(registry.is_empty());
    assert!(registry.get_by_preference("echo").is_none());

    assert_eq!(
        registry.unregister("Echo").unwrap_err(),
        RegistryError::NotFound("Echo".to_string())
    );

    // The key is free again.
    registry.register(echo("Echo Again", "echo")).unwrap();
}

#[test]
fn test_registry_error_display() {
    let err = RegistryError::PreferenceKeyConflict {
        key: "botok_tokenizer".to_string(),
        existing: "Botok Tokenizer".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Preference key 'botok_tokenizer' already claimed by provider 'Botok Tokenizer'"
    );
}

// ============================================================================
// Boundary Tests
// ============================================================================

#[test]
fn test_translate_or_skip_success() {
    let mut registry = ProviderRegistry::new();
    registry.register(echo("Echo", "echo")).unwrap();
    let (bo, en) = langs();

    assert_eq!(
        registry.translate_or_skip("echo", &bo, &en, "abc"),
        Some("ABC".to_string())
    );
    assert_eq!(registry.translate_or_skip("missing", &bo, &en, "abc"), None);
    // Lookup is by preference key, not display name.
    assert_eq!(registry.translate_or_skip("Echo", &bo, &en, "abc"), None);
}

#[test]
fn test_translate_or_skip_degrades_on_failure() {
    let mut registry = ProviderRegistry::new();
    register_plugins(&mut registry, Arc::new(NoProject), LauncherConfig::default()).unwrap();
    let (bo, en) = langs();

    assert_eq!(
        registry.translate_or_skip(BOTOK_PREFERENCE_KEY, &bo, &en, "ཀ"),
        None
    );
}

#[test]
fn test_botok_without_project() {
    let provider = BotokTokenizer::new(Arc::new(NoProject), LauncherConfig::default());
    let (bo, en) = langs();

    let err = provider.translate(&bo, &en, "ཀ").unwrap_err();
    assert!(matches!(err, TokenizeError::Launch(LaunchError::NoProject)));
    assert_eq!(err.kind(), ErrorKind::Launch);
}

#[test]
fn test_language_display() {
    let lang = Language::new("bo-CN");
    assert_eq!(lang.as_str(), "bo-CN");
    assert_eq!(lang.to_string(), "bo-CN");
}
