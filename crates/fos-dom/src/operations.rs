//! DOM Node Operations
//!
//! Error type shared by appendChild, removeChild, insertBefore, replaceChild
//! and selector queries.

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found (never allocated, or already removed)
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("Hierarchy request error: {child} cannot be inserted under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Operation not valid for this node type (e.g., children on a text node)
    #[error("Invalid node type for {0}")]
    InvalidNodeType(NodeId),

    /// Node is not a child of the given parent
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Selector could not be parsed
    #[error("Invalid selector: {0:?}")]
    InvalidSelector(String),
}
