//! Two-way value bindings
//!
//! Elements carrying the binding attribute (`data-bind="key"`) share one
//! value per key. Input elements show it as their `value` attribute, other
//! elements as their text content. Bound elements are looked up in the live
//! tree on every write, so elements added after `set_bindings` take part.

use std::collections::BTreeMap;

use fos_dom::{DomTree, NodeId};

use crate::UiResult;

/// Binding key → current value
#[derive(Debug, Clone)]
pub struct BindingTable {
    attribute: String,
    values: BTreeMap<String, String>,
}

impl BindingTable {
    /// Create a table using `attribute` as the binding marker
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Marker attribute
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Declare binding keys, resetting their values to empty
    pub fn set_bindings<S: AsRef<str>>(&mut self, keys: &[S]) {
        for key in keys {
            self.values.insert(key.as_ref().to_string(), String::new());
        }
    }

    pub fn binding(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Connected elements bound to `key`, in document order
    pub fn bound_elements(&self, tree: &DomTree, key: &str) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .filter(|&id| tree.attribute(id, &self.attribute) == Some(key))
            .collect()
    }

    /// Input on a bound element: every element sharing its key takes the value
    ///
    /// Returns how many elements were written. Elements that are not bound
    /// to a declared key are ignored.
    pub fn input(&mut self, tree: &mut DomTree, element: NodeId, value: &str) -> UiResult<usize> {
        let Some(key) = tree.attribute(element, &self.attribute).map(str::to_string) else {
            return Ok(0);
        };
        if !self.values.contains_key(&key) {
            return Ok(0);
        }
        self.set_binding(tree, &key, value)
    }

    /// Store a value and push it to every element bound to `key`
    pub fn set_binding(&mut self, tree: &mut DomTree, key: &str, value: &str) -> UiResult<usize> {
        let elements = self.bound_elements(tree, key);
        for &id in &elements {
            if tree.tag_name(id) == Some("input") {
                tree.set_attribute(id, "value", value)?;
            } else {
                tree.set_text_content(id, value)?;
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        tracing::debug!("Binding {:?} pushed to {} elements", key, elements.len());
        Ok(elements.len())
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new("data-bind")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(tree: &mut DomTree) -> (NodeId, NodeId) {
        let node = fos_html::build(
            tree,
            r#"<form><input data-bind="name"><p data-bind="name">old</p><i>x</i></form>"#,
        )
        .unwrap();
        tree.append_child(tree.root(), node).unwrap();
        let input = tree.query_selector(node, "input").unwrap().unwrap();
        let p = tree.query_selector(node, "p").unwrap().unwrap();
        (input, p)
    }

    #[test]
    fn test_input_propagates() {
        let mut tree = DomTree::new();
        let (input, p) = page(&mut tree);
        let mut table = BindingTable::default();
        table.set_bindings(&["name"]);
        assert_eq!(table.binding("name"), Some(""));

        assert_eq!(table.input(&mut tree, input, "Ada").unwrap(), 2);
        assert_eq!(tree.attribute(input, "value"), Some("Ada"));
        assert_eq!(tree.text_content(p), "Ada");
        assert_eq!(table.binding("name"), Some("Ada"));
    }

    #[test]
    fn test_input_on_unbound_element() {
        let mut tree = DomTree::new();
        let (_, p) = page(&mut tree);
        let i = tree.query_selector(tree.root(), "i").unwrap().unwrap();
        let mut table = BindingTable::default();
        assert_eq!(table.input(&mut tree, p, "x").unwrap(), 0);
        table.set_bindings(&["name"]);
        assert_eq!(table.input(&mut tree, i, "x").unwrap(), 0);
        assert_eq!(tree.text_content(p), "old");
    }

    #[test]
    fn test_set_binding_programmatic() {
        let mut tree = DomTree::new();
        let (input, _) = page(&mut tree);
        let mut table = BindingTable::new("data-bind");
        table.set_binding(&mut tree, "name", "Grace").unwrap();
        assert_eq!(tree.attribute(input, "value"), Some("Grace"));
        assert_eq!(table.bindings().len(), 1);
    }
}
