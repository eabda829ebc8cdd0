//! Component context
//!
//! Handed to every component callback. Borrows the app mutably, so a hook can
//! write state, render children, query the live tree or talk to the bus.

use fos_dom::{DomTree, NodeId};
use fos_html::Template;
use serde_json::Value;

use crate::app::App;
use crate::component::{ComponentType, Instance, InstanceId, Props};
use crate::globals::Globals;
use crate::state::StateWrite;
use crate::{UiError, UiResult};

/// Which lifecycle hook to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    PreLoad,
    Load,
    Update,
}

/// Access to the running component and its app
pub struct Context<'a> {
    app: &'a mut App,
    id: InstanceId,
}

impl<'a> Context<'a> {
    pub(crate) fn new(app: &'a mut App, id: InstanceId) -> Self {
        Self { app, id }
    }

    /// Id of the running instance
    pub fn id(&self) -> InstanceId {
        self.id
    }

    fn instance(&self) -> UiResult<&Instance> {
        self.app.instance(self.id)
    }

    /// Props of the running instance
    pub fn props(&self) -> Option<&Props> {
        self.instance().ok().map(|i| i.props())
    }

    /// One prop value
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props()?.get(key)
    }

    /// Current state value
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.instance().ok()?.state().get(key)
    }

    /// State value as a string slice
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state(key)?.as_str()
    }

    /// Write a state value, updating the component when the write requires it
    pub fn set_state(&mut self, key: &str, value: impl Into<Value>) -> UiResult<StateWrite> {
        self.app.set_state(self.id, key, value)
    }

    /// Write every entry of a JSON object into state
    pub fn register_state(&mut self, state: Value) -> UiResult<()> {
        let Value::Object(entries) = state else {
            return Err(UiError::TypeMismatch(
                "the provided state must be a JSON object".to_string(),
            ));
        };
        for (key, value) in entries {
            self.set_state(&key, value)?;
        }
        Ok(())
    }

    /// Re-render and patch (through the parent for child instances)
    pub fn update(&mut self) -> UiResult<bool> {
        self.app.update(self.id)
    }

    /// Render a child component held in `slot`
    ///
    /// The child is created on first use; later calls refresh its props when
    /// new ones are given. The child's template is returned for embedding.
    pub fn child_component(
        &mut self,
        ty: ComponentType,
        slot: &str,
        props: Option<Props>,
    ) -> UiResult<Template> {
        let existing = self.instance()?.child(slot);
        let child = match existing {
            Some(child) => {
                if let Some(props) = props {
                    self.app.instance_mut(child)?.props = props;
                }
                child
            }
            None => self.app.create_child(self.id, ty, slot, props.unwrap_or_default())?,
        };
        self.app.render_instance(child)
    }

    /// Child instance held in `slot`
    pub fn child(&self, slot: &str) -> Option<InstanceId> {
        self.instance().ok()?.child(slot)
    }

    /// Live node of the instance (the parent's for children)
    pub fn dom(&self) -> Option<NodeId> {
        self.app.root_dom(self.id)
    }

    /// Elements matching a selector in the component's tree
    ///
    /// Children search their parent's tree. When the component's own subtree
    /// has no match, the search widens to its container.
    pub fn get_elements(&self, selector: &str) -> UiResult<Vec<NodeId>> {
        self.app.elements(self.id, selector)
    }

    /// First element matching a selector
    pub fn get_element(&self, selector: &str) -> UiResult<Option<NodeId>> {
        Ok(self.get_elements(selector)?.into_iter().next())
    }

    /// Subscribe the running instance to an event
    pub fn subscribe(&mut self, name: &str) -> UiResult<()> {
        self.app.subscribe(name, self.id)
    }

    /// Remove the running instance from an event
    pub fn remove_event(&mut self, name: &str) {
        self.app.unsubscribe(name, self.id);
    }

    /// Publish an event to every subscriber
    pub fn publish(&mut self, name: &str, data: Value) -> UiResult<()> {
        self.app.publish(name, data)
    }

    pub fn tree(&self) -> &DomTree {
        self.app.tree()
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        self.app.tree_mut()
    }

    pub fn globals(&self) -> &Globals {
        self.app.globals()
    }

    /// The whole app
    pub fn app(&mut self) -> &mut App {
        &mut *self.app
    }

    pub fn pre_load_children(&mut self) -> UiResult<()> {
        self.run_children(Hook::PreLoad)
    }

    pub fn on_load_children(&mut self) -> UiResult<()> {
        self.run_children(Hook::Load)
    }

    pub fn on_update_children(&mut self) -> UiResult<()> {
        self.run_children(Hook::Update)
    }

    fn run_children(&mut self, hook: Hook) -> UiResult<()> {
        let children: Vec<InstanceId> = self
            .instance()?
            .children()
            .iter()
            .map(|&(_, id)| id)
            .collect();
        for child in children {
            self.app.run_hook(child, hook)?;
        }
        Ok(())
    }
}
