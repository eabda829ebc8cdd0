//! fOS HTML Template Builder
//!
//! Turns templates (markup text or structured data) into detached subtrees of
//! a `fos_dom::DomTree`, using html5ever for parsing.

mod builder;
mod template;

pub use builder::{BuilderOptions, TreeBuilder};
pub use template::Template;

use fos_dom::{DomError, DomTree, NodeId};

/// Build a template into `tree` with default options
pub fn build(tree: &mut DomTree, template: impl Into<Template>) -> Result<NodeId, TemplateError> {
    TreeBuilder::new().build(tree, template)
}

/// Template build error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("An error occurred while building the template ({reason}); check your template data")]
    Malformed { reason: String },

    #[error("Building the template tree failed: {0}")]
    Dom(#[from] DomError),
}
