//! Error types for hidden-state maintenance.

use horizon_veil_selector::SelectorError;
use thiserror::Error;

/// Result type alias for maintainer operations.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Errors reported by a host tree implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The node does not exist in the host tree.
    #[error("Unknown node")]
    UnknownNode,

    /// The host refused the operation.
    #[error("Host rejected the operation: {0}")]
    Rejected(String),
}

/// Errors reported by the marker registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A node was released more times than it was acquired.
    #[error("Marker registry underflow: node holds no marks")]
    Underflow,

    /// Reading or writing the marker attribute failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors that can occur while engaging or disengaging a session.
#[derive(Debug, Error)]
pub enum VeilError {
    /// The filter selector was empty or whitespace.
    #[error("Filter selector is empty")]
    EmptyFilter,

    /// The filter or context selector could not be parsed.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// The context selector matched no element.
    #[error("Context selector '{0}' matched no element")]
    ContextNotFound(String),

    /// The context node does not exist in the host tree.
    #[error("Context node does not exist")]
    UnknownContext,

    /// A host operation failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Settings could not be parsed.
    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    /// Settings could not be serialized.
    #[error("Failed to serialize settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    /// Settings parsed but hold an unusable value.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}
