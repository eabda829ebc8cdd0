//! fOS DOM - Document Object Model
//!
//! Arena-allocated document tree shared by the template builder, the
//! reconciler and the component runtime. Freshly built trees live in the same
//! arena as the live document, detached until they are inserted.

mod classlist;
mod node;
mod operations;
mod query;
mod serialize;
mod tree;

pub use classlist::DOMTokenList;
pub use node::{Attribute, ElementData, Node, NodeData};
pub use operations::{DomError, DomResult};
pub use query::{AttributeOp, AttributeSelector, Selector, SelectorList, SimpleSelector};
pub use serialize::HtmlSerializer;
pub use tree::{Descendants, DomTree};

/// Node identifier (index into arena plus slot generation)
///
/// A removed node's slot may be reused; the generation makes stale ids
/// resolve to nothing instead of to the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Document root node ID
    pub const ROOT: NodeId = NodeId { index: 0, generation: 0 };

    /// Slot index in the arena
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}
