//! Mount coordinator
//!
//! Inserts built trees and component instances into the live document.

use fos_dom::{NodeData, NodeId};

use crate::app::App;
use crate::component::{ComponentType, Instance, InstanceId, Props};
use crate::context::Hook;
use crate::{UiError, UiResult};

/// Something that can be mounted
#[derive(Debug, Clone)]
pub enum Mountable {
    /// Component type plus the props it is created with
    Component { ty: ComponentType, props: Props },
    /// Already built (detached) tree
    Tree(NodeId),
}

/// Where to mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    /// A container node
    Node(NodeId),
    /// First element of the document matching a selector
    Selector(String),
}

impl From<NodeId> for MountTarget {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl App {
    /// Container node of a mount target
    pub fn resolve_target(&self, target: &MountTarget) -> UiResult<NodeId> {
        let container = match target {
            MountTarget::Node(id) => Some(*id),
            MountTarget::Selector(selector) => {
                let root = self.tree().root();
                self.tree().query_selector(root, selector)?
            }
        };
        let valid = container
            .and_then(|id| self.tree().get(id))
            .is_some_and(|node| matches!(node.data, NodeData::Document | NodeData::Element(_)));
        match container {
            Some(id) if valid => Ok(id),
            _ => Err(UiError::ContainerNotFound(match target {
                MountTarget::Node(id) => id.to_string(),
                MountTarget::Selector(selector) => selector.clone(),
            })),
        }
    }

    /// Mount a tree or a component, returning the inserted node
    pub fn mount(&mut self, built: Mountable, target: impl Into<MountTarget>) -> UiResult<NodeId> {
        let container = self.resolve_target(&target.into())?;
        match built {
            Mountable::Tree(node) => {
                self.tree_mut().append_child(container, node)?;
                tracing::debug!("Mounted tree {} into {}", node, container);
                Ok(node)
            }
            Mountable::Component { ty, props } => {
                let id = self.mount_component(ty, props, container)?;
                self.instance(id)?
                    .dom()
                    .ok_or(UiError::UnknownInstance(id))
            }
        }
    }

    /// Mount a component and return its instance id
    ///
    /// The built node is the instance's `dom` while `pre_load` runs, before
    /// it is inserted; `on_load` runs once it is in the document.
    pub fn mount_component(
        &mut self,
        ty: ComponentType,
        props: Props,
        target: impl Into<MountTarget>,
    ) -> UiResult<InstanceId> {
        let container = self.resolve_target(&target.into())?;
        let component = ty.instantiate(&props)?;
        let id = self.instances_mut().insert(Instance::new(ty, component, props));

        match self.load_instance(id, container) {
            Ok(node) => {
                tracing::info!("Mounted component {} as {} at {}", ty.name(), id, node);
                Ok(id)
            }
            Err(e) => {
                tracing::debug!("Mounting {} failed: {}", ty.name(), e);
                self.release_dom(id);
                self.discard_instance(id);
                Err(e)
            }
        }
    }

    fn load_instance(&mut self, id: InstanceId, container: NodeId) -> UiResult<NodeId> {
        let template = self.render_instance(id)?;
        let built = self.build(template)?;
        self.instance_mut(id)?.dom = Some(built);

        self.run_hook(id, Hook::PreLoad)?;

        // pre_load may have patched the tree already
        let node = self.instance(id)?.dom().unwrap_or(built);
        self.tree_mut().append_child(container, node)?;
        self.instance_mut(id)?.dom = Some(node);

        self.run_hook(id, Hook::Load)?;
        Ok(node)
    }

    /// Remove a mounted instance: frees its tree, drops its children and
    /// subscriptions
    pub fn unmount(&mut self, id: InstanceId) -> UiResult<()> {
        let instance = self.instance(id)?;
        let dom = instance.dom();
        let parent = instance.parent();

        if let Some(parent) = parent {
            if let Ok(parent) = self.instance_mut(parent) {
                parent.children.retain(|&(_, child)| child != id);
            }
        }
        if let Some(dom) = dom {
            if self.tree().contains(dom) {
                self.tree_mut().remove_subtree(dom)?;
            }
        }
        self.discard_instance(id);
        tracing::info!("Unmounted {}", id);
        Ok(())
    }

    /// Free the tree an instance built, inserted or not
    fn release_dom(&mut self, id: InstanceId) {
        let Some(dom) = self.instance(id).ok().and_then(|i| i.dom()) else {
            return;
        };
        if !self.tree().contains(dom) {
            return;
        }
        if let Err(e) = self.tree_mut().remove_subtree(dom) {
            tracing::warn!("Could not free the tree of {}: {}", id, e);
        }
    }

    /// Drop an instance with its children and subscriptions
    pub(crate) fn discard_instance(&mut self, id: InstanceId) {
        let Some(instance) = self.instances_mut().remove(id) else {
            return;
        };
        for (_, child) in instance.children {
            self.discard_instance(child);
        }
        self.events_mut().unsubscribe_all(id);
    }
}
