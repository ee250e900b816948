//! Error types for Horizon Veil documents.

use std::fmt;

/// Errors that can occur during document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The node ID is invalid or the node has been destroyed.
    InvalidNodeId,
    /// The insertion would make a node its own ancestor.
    HierarchyViolation,
    /// The node is not a child of the given parent.
    NotAChild,
    /// The document root cannot be moved, removed or destroyed.
    RootMutation,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNodeId => write!(f, "Invalid or destroyed node ID"),
            Self::HierarchyViolation => {
                write!(f, "Cannot insert a node into its own subtree")
            }
            Self::NotAChild => write!(f, "Node is not a child of the given parent"),
            Self::RootMutation => write!(f, "The document root cannot be moved or removed"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Result type for document operations.
pub type DocumentResult<T> = std::result::Result<T, DocumentError>;
