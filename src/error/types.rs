//! Error type definitions
//!
//! Defines the main error types used throughout the POT provider application.

use thiserror::Error;

/// Main error type for the POT provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// A second extraction attempt was requested while one was running.
    /// Not a fault: the running attempt's result satisfies the caller.
    #[error("an extraction attempt is already in progress")]
    AttemptInProgress,

    /// Browser session errors (launch, CDP transport, page creation)
    #[error("Browser error: {message}")]
    Browser { message: String },

    /// The target page or player control could not be reached
    #[error("Navigation error: {message}")]
    Navigation { message: String },

    /// The player API request was never observed within the bounded wait
    #[error("timed out after {seconds}s waiting for the player API request")]
    ExtractionTimeout { seconds: u64 },

    /// The player request body was malformed or missing required fields
    #[error("Token parse error: {message}")]
    TokenParse { message: String },

    /// A token was captured but is too short to be trusted
    #[error("captured token is only {length} characters and unlikely to be valid")]
    ImplausibleToken { length: usize },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a browser session error
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Create a navigation error
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    /// Create an extraction timeout error
    pub fn extraction_timeout(seconds: u64) -> Self {
        Self::ExtractionTimeout { seconds }
    }

    /// Create a token parse error
    pub fn token_parse(message: impl Into<String>) -> Self {
        Self::TokenParse {
            message: message.into(),
        }
    }

    /// Create an implausible token error
    pub fn implausible_token(length: usize) -> Self {
        Self::ImplausibleToken { length }
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
