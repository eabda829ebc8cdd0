//! Tree builder
//!
//! Normalizes template text, parses it with html5ever's RcDom and converts
//! the result into detached subtrees of our arena.

use fos_dom::{DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::{Template, TemplateError};

/// Tag of the container built for blank templates
pub const DEFAULT_EMPTY_TAG: &str = "span";

/// Builder options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Element created when the template is blank
    pub empty_tag: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            empty_tag: DEFAULT_EMPTY_TAG.to_string(),
        }
    }
}

/// Builds templates into detached trees
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    options: BuilderOptions,
}

impl TreeBuilder {
    /// Create a builder with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with custom options
    pub fn with_options(options: BuilderOptions) -> Self {
        Self { options }
    }

    /// Builder options
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build the first top-level node of a template
    ///
    /// Blank templates build an empty container element. The returned node
    /// has no parent.
    pub fn build(
        &self,
        tree: &mut DomTree,
        template: impl Into<Template>,
    ) -> Result<NodeId, TemplateError> {
        let template = template.into();
        let source = normalize(&template.source());
        if source.is_empty() {
            return Ok(tree.create_element(&self.options.empty_tag));
        }

        // The parsed document owns every handle below it; keep it alive
        // until conversion is done
        let dom = parse(&source)?;
        let body = find_body(&dom)?;
        let first = body
            .children
            .borrow()
            .iter()
            .find(|child| is_tree_node(child))
            .cloned()
            .ok_or_else(|| TemplateError::Malformed {
                reason: "no element or text node".to_string(),
            })?;

        let id = convert(&first, tree)?;
        tracing::debug!("Built template into {} ({} bytes)", id, source.len());
        Ok(id)
    }

    /// Build every top-level node of a template, in document order
    pub fn build_all(
        &self,
        tree: &mut DomTree,
        template: impl Into<Template>,
    ) -> Result<Vec<NodeId>, TemplateError> {
        let template = template.into();
        let source = normalize(&template.source());
        if source.is_empty() {
            return Ok(vec![tree.create_element(&self.options.empty_tag)]);
        }

        let dom = parse(&source)?;
        let body = find_body(&dom)?;
        let nodes = body
            .children
            .borrow()
            .iter()
            .filter(|child| is_tree_node(child))
            .map(|child| convert(child, tree))
            .collect::<Result<Vec<_>, _>>()?;
        if nodes.is_empty() {
            return Err(TemplateError::Malformed {
                reason: "no element or text node".to_string(),
            });
        }
        tracing::debug!("Built {} top-level nodes", nodes.len());
        Ok(nodes)
    }
}

/// Trim every line and drop the line breaks
pub fn normalize(source: &str) -> String {
    source.lines().map(str::trim).collect()
}

/// Parse normalized markup into a full document
fn parse(source: &str) -> Result<RcDom, TemplateError> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut source.as_bytes())
        .map_err(|e| TemplateError::Malformed {
            reason: e.to_string(),
        })
}

/// The synthesized `<body>` element of a parsed document
fn find_body(dom: &RcDom) -> Result<Handle, TemplateError> {
    let html = find_element(&dom.document, "html").ok_or_else(|| TemplateError::Malformed {
        reason: "missing html element".to_string(),
    })?;
    find_element(&html, "body").ok_or_else(|| TemplateError::Malformed {
        reason: "missing body element".to_string(),
    })
}

fn find_element(parent: &Handle, local: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| match &child.data {
            RcNodeData::Element { name, .. } => name.local.as_ref() == local,
            _ => false,
        })
        .cloned()
}

fn is_tree_node(handle: &Handle) -> bool {
    matches!(
        handle.data,
        RcNodeData::Element { .. } | RcNodeData::Text { .. }
    )
}

/// Convert an RcDom node (and its subtree) into a detached arena node
fn convert(handle: &Handle, tree: &mut DomTree) -> Result<NodeId, TemplateError> {
    match &handle.data {
        RcNodeData::Text { contents } => Ok(tree.create_text(&contents.borrow())),
        RcNodeData::Element { name, attrs, .. } => {
            let id = tree.create_element(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                tree.set_attribute(id, attr.name.local.as_ref(), &attr.value)?;
            }
            for child in handle.children.borrow().iter() {
                if !is_tree_node(child) {
                    continue;
                }
                let child_id = convert(child, tree)?;
                tree.append_child(id, child_id)?;
            }
            Ok(id)
        }
        _ => Err(TemplateError::Malformed {
            reason: "unsupported node kind".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  <div>\n    <p>a</p>\n  </div>\n"), "<div><p>a</p></div>");
        assert_eq!(normalize("\n \t\n"), "");
    }

    #[test]
    fn test_build_element() {
        let mut tree = DomTree::new();
        let div = TreeBuilder::new()
            .build(&mut tree, "<div id=\"a\" class=\"x y\"><span>hi</span></div>")
            .unwrap();
        assert_eq!(tree.tag_name(div), Some("div"));
        assert_eq!(tree.attribute(div, "id"), Some("a"));
        assert_eq!(tree.parent(div), None);
        assert_eq!(tree.child_count(div), 1);
        assert_eq!(tree.text_content(div), "hi");
    }

    #[test]
    fn test_build_blank_uses_empty_tag() {
        let mut tree = DomTree::new();
        let builder = TreeBuilder::with_options(BuilderOptions {
            empty_tag: "div".to_string(),
        });
        let node = builder.build(&mut tree, "   ").unwrap();
        assert_eq!(tree.tag_name(node), Some("div"));
        assert_eq!(tree.child_count(node), 0);
    }

    #[test]
    fn test_build_text_only() {
        let mut tree = DomTree::new();
        let node = TreeBuilder::new().build(&mut tree, "hello").unwrap();
        assert_eq!(tree.text(node), Some("hello"));
    }

    #[test]
    fn test_comment_only_is_malformed() {
        let mut tree = DomTree::new();
        let err = TreeBuilder::new().build(&mut tree, "<!-- nothing -->").unwrap_err();
        assert!(err.to_string().contains("check your template data"));
    }

    #[test]
    fn test_build_keeps_nested_children() {
        let mut tree = DomTree::new();
        let ul = TreeBuilder::new()
            .build(&mut tree, "<ul><li>a</li><li class=\"b\">b</li></ul>")
            .unwrap();
        assert_eq!(tree.tag_name(ul), Some("ul"));
        assert_eq!(tree.child_count(ul), 2);
        let second = tree.children(ul)[1];
        assert_eq!(tree.attribute(second, "class"), Some("b"));
        assert_eq!(tree.text_content(ul), "ab");
    }

    #[test]
    fn test_convert_rejects_comment() {
        let mut tree = DomTree::new();
        let comment = markup5ever_rcdom::Node::new(RcNodeData::Comment {
            contents: "c".into(),
        });
        assert!(matches!(
            convert(&comment, &mut tree),
            Err(TemplateError::Malformed { .. })
        ));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_build_all() {
        let mut tree = DomTree::new();
        let nodes = TreeBuilder::new()
            .build_all(&mut tree, "<p>a</p><!-- c --><p>b</p>")
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(tree.text_content(nodes[1]), "b");
    }
}
