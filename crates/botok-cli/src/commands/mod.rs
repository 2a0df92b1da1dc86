//! CLI command implementations

pub mod decode;
pub mod encode;
pub mod providers;
pub mod tokenize;

mod reporting;
