//! Minimal configuration module for docshift core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod engine;
pub mod types;

pub use engine::{EngineConfig, EXTRACTION_FAILED_SENTINEL};
pub use types::{ModelParams, Protocol, ResolvedLlmConfig};
