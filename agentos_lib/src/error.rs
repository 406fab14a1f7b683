//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;

/// Errors produced by the library layer, wrapping upstream API errors and
/// adding local validation and controller-state failures.
#[derive(Debug)]
pub enum AgentOsError {
    /// An error from the underlying API client.
    Api(agentos_api::Error),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// User-provided input failed validation. No request was sent.
    InvalidInput(String),
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// No resource with this name is registered.
    UnknownResource(String),
    /// The resource does not offer this action.
    UnsupportedAction { resource: String, action: String },
    /// Another action is already awaiting confirmation or in flight.
    ActionInFlight,
    /// There is no pending action to confirm.
    NoPendingAction,
    /// The record was not found.
    NotFound(String),
    /// The embedded demo data could not be loaded.
    Fixture(String),
}

impl AgentOsError {
    /// Message suitable for a notification. Upstream body snippets stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    /// True when the failure happened locally before any request was issued.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl fmt::Display for AgentOsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::UnknownResource(name) => write!(f, "Unknown resource '{}'", name),
            Self::UnsupportedAction { resource, action } => {
                write!(f, "Resource '{}' does not support '{}'", resource, action)
            }
            Self::ActionInFlight => write!(f, "Another action is already pending"),
            Self::NoPendingAction => write!(f, "No action is pending"),
            Self::NotFound(id) => write!(f, "Record '{}' not found", id),
            Self::Fixture(msg) => write!(f, "Fixture data error: {}", msg),
        }
    }
}

impl std::error::Error for AgentOsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<agentos_api::Error> for AgentOsError {
    fn from(e: agentos_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<serde_json::Error> for AgentOsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

impl From<ConfigError> for AgentOsError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
