//! Error types and handling for docshift core

use thiserror::Error;

/// Result type alias for docshift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docshift core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// User input rejected before any side effect
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Edit splicing errors
    #[error("Splice error: {0}")]
    Splice(#[from] SpliceError),

    /// Prompt template errors
    #[error("Prompt error: {message}")]
    Prompt { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },
}

/// Validation errors surfaced to the user as notices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a search query")]
    EmptyQuery,

    #[error("Please enter replacement text")]
    EmptyReplacement,

    #[error("No documents loaded")]
    NoDocuments,

    #[error("None of the loaded documents contain searchable text")]
    NoSearchableDocuments,

    #[error("No matches selected")]
    NoSelection,

    #[error("A review is already open")]
    ReviewInProgress,

    #[error("No review is open")]
    NoReviewOpen,

    #[error("Unknown document: {id}")]
    UnknownDocument { id: String },

    #[error("Unknown match: {id}")]
    UnknownMatch { id: String },
}

/// Edit splicing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpliceError {
    #[error("Edit at {offset}..{end} is outside content of length {len}")]
    OutOfBounds { offset: usize, end: usize, len: usize },

    #[error("Edit at {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("Edits at {first} and {second} overlap")]
    Overlap { first: usize, second: usize },

    #[error("Text at {offset} no longer matches {expected:?}")]
    Stale { offset: usize, expected: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
