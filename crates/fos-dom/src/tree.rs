//! DOM Tree (arena-based allocation)
//!
//! Generational arena of nodes. Slot 0 always holds the document root; every
//! other node is either reachable from it (live) or detached (freshly built,
//! or removed but not yet freed).

use crate::classlist::DOMTokenList;
use crate::node::{Node, NodeData};
use crate::{DomError, DomResult, NodeId};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
}

impl DomTree {
    /// Create a tree holding only the document root
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::document()),
            }],
            free_list: Vec::new(),
            live: 1,
        }
    }

    /// The document root
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Whether the id refers to an allocated node
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of allocated nodes (live and detached)
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if tree holds nothing but the document root
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(Node::text(text))
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of children
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        self.node(child)?;
        if parent_node.is_text() {
            return Err(DomError::InvalidNodeType(parent));
        }
        if child == NodeId::ROOT || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Detach a node from its parent (no-op when already detached)
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|&c| c != id);
            }
            self.node_mut(id)?.parent = None;
        }
        Ok(())
    }

    /// Append a child node, moving it out of its current parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(child)
    }

    /// Insert before a reference node (append when `reference` is None)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        let Some(reference) = reference else {
            return self.append_child(parent, new_child);
        };
        if reference == new_child {
            return Ok(new_child);
        }
        self.check_insert(parent, new_child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: reference,
            });
        }
        self.detach(new_child)?;
        let pos = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NotAChild {
                parent,
                child: reference,
            })?;
        self.node_mut(parent)?.children.insert(pos, new_child);
        self.node_mut(new_child)?.parent = Some(parent);
        Ok(new_child)
    }

    /// Remove a child node; it stays allocated and detached
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        Ok(child)
    }

    /// Replace `old_child` with `new_child`, returning the detached old child
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        if self.parent(old_child) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: old_child,
            });
        }
        if new_child == old_child {
            return Ok(old_child);
        }
        self.check_insert(parent, new_child)?;
        self.detach(new_child)?;
        let pos = self
            .children(parent)
            .iter()
            .position(|&c| c == old_child)
            .ok_or(DomError::NotAChild {
                parent,
                child: old_child,
            })?;
        self.node_mut(parent)?.children[pos] = new_child;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        Ok(old_child)
    }

    /// Deep copy of a subtree; the copy is detached
    pub fn clone_subtree(&mut self, id: NodeId) -> DomResult<NodeId> {
        let data = self.node(id)?.data.clone();
        if matches!(data, NodeData::Document) {
            return Err(DomError::InvalidNodeType(id));
        }
        let copy = self.alloc(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            self.node_mut(child_copy)?.parent = Some(copy);
            self.node_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    /// Detach and free a node with all its descendants, returning how many
    /// nodes were freed. Ids of freed nodes become stale.
    pub fn remove_subtree(&mut self, id: NodeId) -> DomResult<usize> {
        if id == NodeId::ROOT {
            return Err(DomError::InvalidNodeType(id));
        }
        self.detach(id)?;
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(current.index);
                self.live -= 1;
                freed += 1;
                stack.extend(node.children);
            }
        }
        tracing::trace!("Freed {} nodes under {}", freed, id);
        Ok(freed)
    }

    /// Pre-order iterator over the descendants of a node (excluding it)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Tag name: lower-case element name, `#text` or `#document`
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.tag_name())
    }

    /// Text of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| n.as_text())
    }

    /// Overwrite the value of a text node in place
    pub fn set_text(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(content) => {
                if content != text {
                    content.clear();
                    content.push_str(text);
                }
                Ok(())
            }
            _ => Err(DomError::InvalidNodeType(id)),
        }
    }

    /// Concatenated text of a node and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .filter_map(|d| self.text(d))
            .collect()
    }

    /// Replace all children of an element with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if self.node(id)?.is_text() {
            return self.set_text(id, text);
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.remove_subtree(child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node)?;
        }
        Ok(())
    }

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Attribute names of an element in insertion order
    pub fn attribute_names(&self, id: NodeId) -> Vec<&str> {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.attr_names().collect())
            .unwrap_or_default()
    }

    /// Set an attribute, returning the previous value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<Option<String>> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(elem.set_attr(name, value))
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(elem.remove_attr(name))
    }

    /// Snapshot of an element's class list
    pub fn class_list(&self, id: NodeId) -> DOMTokenList {
        DOMTokenList::from_string(self.attribute(id, "class").unwrap_or(""))
    }

    /// Add class tokens, keeping the ones already present
    pub fn add_classes(&mut self, id: NodeId, tokens: &[&str]) -> DomResult<()> {
        let mut list = self.class_list(id);
        let before = list.length();
        list.add(tokens);
        if list.length() != before {
            self.set_attribute(id, "class", &list.value())?;
        }
        Ok(())
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order descendant iterator
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tree: &mut DomTree) -> (NodeId, NodeId, NodeId) {
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let text = tree.create_text("hi");
        tree.append_child(span, text).unwrap();
        tree.append_child(div, span).unwrap();
        (div, span, text)
    }

    #[test]
    fn test_append_and_connect() {
        let mut tree = DomTree::new();
        let (div, span, text) = sample(&mut tree);
        assert!(!tree.is_connected(div));

        tree.append_child(tree.root(), div).unwrap();
        assert!(tree.is_connected(text));
        assert_eq!(tree.parent(span), Some(div));
        assert_eq!(tree.children(div), &[span]);
    }

    #[test]
    fn test_hierarchy_request() {
        let mut tree = DomTree::new();
        let (div, span, text) = sample(&mut tree);
        assert!(matches!(
            tree.append_child(span, div),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert_eq!(
            tree.append_child(text, div),
            Err(DomError::InvalidNodeType(text))
        );
    }

    #[test]
    fn test_replace_child() {
        let mut tree = DomTree::new();
        let (div, span, _) = sample(&mut tree);
        let p = tree.create_element("p");
        assert_eq!(tree.replace_child(div, p, span), Ok(span));
        assert_eq!(tree.children(div), &[p]);
        assert_eq!(tree.parent(span), None);
    }

    #[test]
    fn test_insert_before() {
        let mut tree = DomTree::new();
        let (div, span, _) = sample(&mut tree);
        let first = tree.create_element("b");
        tree.insert_before(div, first, Some(span)).unwrap();
        assert_eq!(tree.children(div), &[first, span]);
    }

    #[test]
    fn test_remove_subtree_frees_and_invalidates() {
        let mut tree = DomTree::new();
        let (div, span, text) = sample(&mut tree);
        assert_eq!(tree.len(), 4);

        assert_eq!(tree.remove_subtree(div), Ok(3));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(span));
        assert!(!tree.contains(text));

        // Reused slot gets a new generation
        let reused = tree.create_element("p");
        assert_ne!(reused, div);
        assert!(!tree.contains(div));
    }

    #[test]
    fn test_clone_subtree() {
        let mut tree = DomTree::new();
        let (div, _, _) = sample(&mut tree);
        tree.set_attribute(div, "id", "main").unwrap();
        let copy = tree.clone_subtree(div).unwrap();
        assert_ne!(copy, div);
        assert_eq!(tree.attribute(copy, "id"), Some("main"));
        assert_eq!(tree.text_content(copy), "hi");
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let (div, span, text) = sample(&mut tree);
        let tail = tree.create_element("i");
        tree.append_child(div, tail).unwrap();
        let order: Vec<_> = tree.descendants(div).collect();
        assert_eq!(order, vec![span, text, tail]);
    }

    #[test]
    fn test_set_text_content() {
        let mut tree = DomTree::new();
        let (div, span, _) = sample(&mut tree);
        tree.set_text_content(div, "bye").unwrap();
        assert!(!tree.contains(span));
        assert_eq!(tree.text_content(div), "bye");
    }

    #[test]
    fn test_add_classes_accumulates() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "a").unwrap();
        tree.add_classes(div, &["a", "b"]).unwrap();
        assert_eq!(tree.attribute(div, "class"), Some("a b"));
    }
}
