//! Error types for selector parsing.

/// Result type alias for selector operations.
pub type Result<T> = std::result::Result<T, SelectorError>;

/// Errors that can occur while parsing a selector list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector text was empty or contained only whitespace.
    #[error("Empty selector")]
    Empty,

    /// The selector could not be parsed.
    #[error("Invalid selector '{selector}' at line {line}, column {column}: {message}")]
    Invalid {
        selector: String,
        message: String,
        line: u32,
        column: u32,
    },
}

impl SelectorError {
    /// Create an invalid-selector error.
    pub fn invalid(
        selector: impl Into<String>,
        message: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self::Invalid {
            selector: selector.into(),
            message: message.into(),
            line,
            column,
        }
    }
}
