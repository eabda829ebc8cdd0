//! Reconciler
//!
//! Patches a live tree so it matches a freshly built one. Matching is
//! positional: same tag keeps the node and recurses, a different tag or a
//! different child count replaces the node wholesale.
//!
//! Known gaps, kept on purpose: attributes are never removed by a patch and
//! class tokens only accumulate.

use fos_dom::{DomError, DomResult, DomTree, NodeId};
use fos_html::{Template, TreeBuilder};
use serde_json::Value;

use crate::UiResult;

/// Right-hand side of a patch
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    /// Already built node; the reconciler takes ownership of it
    Node(NodeId),
    /// Template built before patching
    Template(Template),
}

impl From<NodeId> for Renderable {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<Template> for Renderable {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

impl From<&str> for Renderable {
    fn from(markup: &str) -> Self {
        Self::Template(markup.into())
    }
}

impl From<String> for Renderable {
    fn from(markup: String) -> Self {
        Self::Template(markup.into())
    }
}

impl From<Value> for Renderable {
    fn from(value: Value) -> Self {
        Self::Template(value.into())
    }
}

/// Counters for one top-level patch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Nodes replaced wholesale
    pub replacements: usize,
    /// Text nodes overwritten in place
    pub text_updates: usize,
    /// Attribute writes (class merges included)
    pub attribute_writes: usize,
    /// Nodes freed after the patch
    pub freed: usize,
}

/// Tree reconciler
#[derive(Debug, Clone)]
pub struct Reconciler {
    builder: TreeBuilder,
    free_discarded: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::with_builder(TreeBuilder::new(), true)
    }

    /// Create a reconciler with a custom builder
    pub fn with_builder(builder: TreeBuilder, free_discarded: bool) -> Self {
        Self {
            builder,
            free_discarded,
        }
    }

    /// Builder used for template right-hand sides
    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Patch `previous` to match `next`, returning the live node
    ///
    /// The result is `previous` unless it had to be replaced, in which case
    /// it is the replacement.
    pub fn patch(
        &self,
        tree: &mut DomTree,
        previous: NodeId,
        next: impl Into<Renderable>,
    ) -> UiResult<NodeId> {
        self.patch_with_stats(tree, previous, next)
            .map(|(live, _)| live)
    }

    /// Same as `patch`, also returning the patch counters
    pub fn patch_with_stats(
        &self,
        tree: &mut DomTree,
        previous: NodeId,
        next: impl Into<Renderable>,
    ) -> UiResult<(NodeId, PatchStats)> {
        if !tree.contains(previous) {
            return Err(DomError::NotFound(previous).into());
        }
        let next = match next.into() {
            Renderable::Node(id) => id,
            Renderable::Template(template) => self.builder.build(tree, template)?,
        };

        let mut patcher = Patcher {
            tree: &mut *tree,
            stats: PatchStats::default(),
            discarded: Vec::new(),
            adopted: Vec::new(),
        };
        let live = patcher.patch(previous, next)?;
        let Patcher {
            mut stats,
            mut discarded,
            ..
        } = patcher;

        if self.free_discarded {
            discarded.push(previous);
            discarded.push(next);
            stats.freed = free_unreachable(tree, &discarded, live)?;
        }

        tracing::debug!(
            "Patched {} -> {}: {} replacements, {} text updates, {} attribute writes, {} freed",
            previous,
            live,
            stats.replacements,
            stats.text_updates,
            stats.attribute_writes,
            stats.freed
        );
        Ok((live, stats))
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Free nodes left over by a patch
///
/// Anything connected to the document, or belonging to the live subtree,
/// stays allocated.
fn free_unreachable(tree: &mut DomTree, candidates: &[NodeId], live: NodeId) -> DomResult<usize> {
    let mut freed = 0;
    for &id in candidates {
        if id == NodeId::ROOT || !tree.contains(id) || tree.is_connected(id) {
            continue;
        }
        if tree.is_inclusive_ancestor(id, live) || tree.is_inclusive_ancestor(live, id) {
            continue;
        }
        freed += tree.remove_subtree(id)?;
    }
    Ok(freed)
}

struct Patcher<'t> {
    tree: &'t mut DomTree,
    stats: PatchStats,
    discarded: Vec<NodeId>,
    /// Replacements whose subtrees are live results; the refinement pass
    /// may read them but never move nodes out of them
    adopted: Vec<NodeId>,
}

impl Patcher<'_> {
    fn patch(&mut self, prev: NodeId, next: NodeId) -> DomResult<NodeId> {
        let (Some(prev_tag), Some(next_tag)) = (self.tree.tag_name(prev), self.tree.tag_name(next))
        else {
            let missing = if self.tree.contains(prev) { next } else { prev };
            return Err(DomError::NotFound(missing));
        };

        if prev_tag != next_tag {
            tracing::trace!("Tag changed at {} ({} -> {})", prev, prev_tag, next_tag);
            return self.replace(prev, next);
        }
        if self.tree.text(prev).is_some() {
            self.patch_text(prev, next)?;
            return Ok(prev);
        }
        self.diff(prev, next)
    }

    /// Put `next` where `prev` is; connected or adopted nodes are cloned,
    /// not moved
    fn replace(&mut self, prev: NodeId, next: NodeId) -> DomResult<NodeId> {
        let adopted = self
            .adopted
            .iter()
            .any(|&root| self.tree.is_inclusive_ancestor(root, next));
        let replacement = if adopted || self.tree.is_connected(next) {
            self.tree.clone_subtree(next)?
        } else {
            next
        };
        if let Some(parent) = self.tree.parent(prev) {
            self.tree.replace_child(parent, replacement, prev)?;
            self.discarded.push(prev);
        }
        self.stats.replacements += 1;
        Ok(replacement)
    }

    fn diff(&mut self, prev: NodeId, next: NodeId) -> DomResult<NodeId> {
        let prev_children = self.tree.children(prev).to_vec();
        let next_children = self.tree.children(next).to_vec();

        let live = if prev_children.len() == next_children.len() {
            self.diff_children(&prev_children, &next_children)?;
            prev
        } else {
            tracing::trace!(
                "Child count changed at {} ({} -> {})",
                prev,
                prev_children.len(),
                next_children.len()
            );
            let live = self.replace(prev, next)?;
            // Refinement pass: previous children against the replacement's
            let live_children = self.tree.children(live).to_vec();
            self.adopted.push(live);
            let refined = self.diff_children(&prev_children, &live_children);
            self.adopted.pop();
            refined?;
            live
        };

        self.diff_attrs(prev, next)?;
        Ok(live)
    }

    fn diff_children(&mut self, prev: &[NodeId], next: &[NodeId]) -> DomResult<()> {
        for (&p, &n) in prev.iter().zip(next) {
            self.patch(p, n)?;
        }
        Ok(())
    }

    fn patch_text(&mut self, prev: NodeId, next: NodeId) -> DomResult<()> {
        let Some(value) = self.tree.text(next) else {
            return Err(DomError::InvalidNodeType(next));
        };
        if self.tree.text(prev) != Some(value) {
            let value = value.to_string();
            self.tree.set_text(prev, &value)?;
            self.stats.text_updates += 1;
        }
        Ok(())
    }

    fn diff_attrs(&mut self, prev: NodeId, next: NodeId) -> DomResult<()> {
        let is_element = |tree: &DomTree, id| tree.get(id).is_some_and(|n| n.is_element());
        if !is_element(&*self.tree, prev) || !is_element(&*self.tree, next) {
            return Ok(());
        }

        let new_attrs: Vec<(String, String)> = self
            .tree
            .attribute_names(next)
            .into_iter()
            .map(|name| {
                let value = self.tree.attribute(next, name).unwrap_or_default();
                (name.to_string(), value.to_string())
            })
            .collect();

        let mut old_names: Vec<&str> = self.tree.attribute_names(prev);
        let mut new_names: Vec<&str> = new_attrs.iter().map(|(n, _)| n.as_str()).collect();
        old_names.sort_unstable();
        new_names.sort_unstable();
        let same_names = old_names == new_names;

        for (name, value) in &new_attrs {
            if same_names {
                if self.tree.attribute(prev, name) == Some(value.as_str()) {
                    continue;
                }
                if name == "class" {
                    let tokens: Vec<&str> = value.split_whitespace().collect();
                    self.tree.add_classes(prev, &tokens)?;
                    self.stats.attribute_writes += 1;
                    continue;
                }
            }
            self.tree.set_attribute(prev, name, value)?;
            self.stats.attribute_writes += 1;
        }
        Ok(())
    }
}
