//! Botok Tokenizer Bridge
//!
//! This crate lets a translation-assistance host use the Botok Tibetan
//! tokenizer, which ships as a Python script inside each project, as a
//! translation provider.
//!
//! # Architecture
//!
//! The bridge uses a two-part architecture:
//!
//! 1. **Rust Launcher** - Spawns the interpreter with the script and the
//!    segment text as separate arguments, under a deadline
//! 2. **Python Script** - Tokenizes the text and prints the result
//!
//! # Output Protocol
//!
//! The script prints the UTF-8 byte count of its result on the first line,
//! then one decimal byte value per line. [`decoder`] turns that back into a
//! string. Digits survive any console code page, which raw Tibetan text
//! does not.
//!
//! # Example
//!
//! ```ignore
//! use botok_bridge::{register_plugins, FixedProject, Language, LauncherConfig, ProviderRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = ProviderRegistry::new();
//! let project = Arc::new(FixedProject("/path/to/project".into()));
//! register_plugins(&mut registry, project, LauncherConfig::default())?;
//!
//! let bo = Language::new("bo");
//! let en = Language::new("en");
//! let tokens = registry.translate_or_skip("botok_tokenizer", &bo, &en, "བཀྲ་ཤིས་བདེ་ལེགས།");
//! ```
//!
//! # Crate Structure
//!
//! - [`launcher`] - Subprocess management
//! - [`decoder`] - Byte-line protocol decoder
//! - [`provider`] - Host-facing provider trait and the Botok provider
//! - [`registry`] - Provider registration
//! - [`config`] - Launcher configuration
//! - [`error`] - Error types

pub mod config;
pub mod decoder;
pub mod error;
pub mod launcher;
pub mod provider;
pub mod registry;

use std::sync::Arc;

// Re-export main types at crate root
pub use config::{ConfigError, LauncherConfig};
pub use decoder::{decode, decode_lines, decode_reader, encode_payload, ByteStreamDecoder};
pub use error::{
    DecodeError, ErrorKind, LaunchError, ProtocolError, TokenizeError, TokenizeResult,
};
pub use launcher::{invoke, InvocationRequest, Launcher, OutputLineStream, ProcessOutcome};
pub use provider::{
    BotokTokenizer, FixedProject, Language, ProjectContext, TranslationProvider, BOTOK_NAME,
    BOTOK_PREFERENCE_KEY,
};
pub use registry::{ProviderRegistry, RegistryError};

/// Registers this crate's providers with the host.
///
/// The host calls this once at startup.
pub fn register_plugins(
    registry: &mut ProviderRegistry,
    context: Arc<dyn ProjectContext>,
    config: LauncherConfig,
) -> Result<(), RegistryError> {
    registry.register(Arc::new(BotokTokenizer::new(context, config)))
}

#[cfg(test)]
mod tests;
