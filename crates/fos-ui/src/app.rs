//! Application
//!
//! Owns the document tree and every piece of runtime state: component
//! instances, event subscriptions, the registry, globals and bindings.

use fos_dom::{DomTree, NodeId};
use fos_html::{Template, TreeBuilder};
use serde_json::Value;

use crate::bindings::BindingTable;
use crate::component::{ComponentArena, ComponentType, Instance, InstanceId, Props};
use crate::config::Config;
use crate::context::{Context, Hook};
use crate::events::EventBus;
use crate::globals::Globals;
use crate::mount::{MountTarget, Mountable};
use crate::reconcile::{Reconciler, Renderable};
use crate::registry::{ComponentRegistry, Gate};
use crate::state::StateWrite;
use crate::{UiError, UiResult};

/// What `App::render` mounts
#[derive(Debug, Clone)]
pub enum RenderSource {
    /// Component type
    Component(ComponentType),
    /// Component registered under a name
    Registered(String),
    /// Plain template
    Template(Template),
}

impl From<ComponentType> for RenderSource {
    fn from(ty: ComponentType) -> Self {
        Self::Component(ty)
    }
}

impl From<Template> for RenderSource {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

/// UI application
#[derive(Debug)]
pub struct App {
    config: Config,
    tree: DomTree,
    reconciler: Reconciler,
    instances: ComponentArena,
    events: EventBus,
    registry: ComponentRegistry,
    globals: Globals,
    bindings: BindingTable,
}

impl App {
    /// Create an app with an empty document
    pub fn new(config: Config) -> Self {
        tracing::info!("Creating fOS UI app");
        let builder = TreeBuilder::with_options(config.builder_options());
        Self {
            reconciler: Reconciler::with_builder(builder, config.free_discarded),
            bindings: BindingTable::new(&config.binding_attribute),
            config,
            tree: DomTree::new(),
            instances: ComponentArena::new(),
            events: EventBus::new(),
            registry: ComponentRegistry::new(),
            globals: Globals::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.globals
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub(crate) fn instances_mut(&mut self) -> &mut ComponentArena {
        &mut self.instances
    }

    /// Seal globals and the component registry
    pub fn freeze(&mut self) {
        self.globals.freeze();
        self.registry.freeze();
        tracing::info!("App configuration frozen");
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Build a template into a detached tree
    pub fn build(&mut self, template: impl Into<Template>) -> UiResult<NodeId> {
        Ok(self.reconciler.builder().build(&mut self.tree, template)?)
    }

    /// Render a component, a registered name or a template into `target`
    ///
    /// Returns `Ok(None)` when the registered component's gate withholds it.
    pub fn render(
        &mut self,
        source: impl Into<RenderSource>,
        target: impl Into<MountTarget>,
        props: Props,
    ) -> UiResult<Option<NodeId>> {
        let container = self.resolve_target(&target.into())?;
        match source.into() {
            RenderSource::Component(ty) => self
                .mount(Mountable::Component { ty, props }, container)
                .map(Some),
            RenderSource::Registered(name) => {
                let registration = self.registry.resolve(&name)?.clone();
                if !self.registry.allows(&registration, &self.globals) {
                    tracing::info!("Render of {:?} withheld by its gate", name);
                    return Ok(None);
                }
                self.mount(
                    Mountable::Component {
                        ty: registration.ty,
                        props,
                    },
                    container,
                )
                .map(Some)
            }
            RenderSource::Template(template) => {
                let node = self.build(template)?;
                self.mount(Mountable::Tree(node), container).map(Some)
            }
        }
    }

    /// Patch `previous` to match `next`, returning the live node
    pub fn patch(&mut self, previous: NodeId, next: impl Into<Renderable>) -> UiResult<NodeId> {
        self.reconciler.patch(&mut self.tree, previous, next)
    }

    /// Register a component under a name
    pub fn name_component(
        &mut self,
        name: &str,
        ty: ComponentType,
        gate: Option<Gate>,
    ) -> UiResult<bool> {
        self.registry.name_component(name, ty, gate)
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    pub fn instance(&self, id: InstanceId) -> UiResult<&Instance> {
        self.instances.get(id).ok_or(UiError::UnknownInstance(id))
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> UiResult<&mut Instance> {
        self.instances.get_mut(id).ok_or(UiError::UnknownInstance(id))
    }

    /// Root instance whose live node is `node`
    pub fn instance_at(&self, node: NodeId) -> Option<InstanceId> {
        self.instances.ids().find(|&id| {
            self.instances
                .get(id)
                .is_some_and(|i| !i.is_child() && i.dom() == Some(node))
        })
    }

    pub(crate) fn render_instance(&mut self, id: InstanceId) -> UiResult<Template> {
        let component = self.instance(id)?.component();
        component.render(&mut Context::new(self, id))
    }

    pub(crate) fn run_hook(&mut self, id: InstanceId, hook: Hook) -> UiResult<()> {
        let component = self.instance(id)?.component();
        let mut cx = Context::new(self, id);
        match hook {
            Hook::PreLoad => component.pre_load(&mut cx),
            Hook::Load => component.on_load(&mut cx),
            Hook::Update => component.on_update(&mut cx),
        }
    }

    pub(crate) fn create_child(
        &mut self,
        parent: InstanceId,
        ty: ComponentType,
        slot: &str,
        props: Props,
    ) -> UiResult<InstanceId> {
        let component = ty.instantiate(&props)?;
        let mut instance = Instance::new(ty, component, props);
        instance.parent = Some(parent);
        let child = self.instances.insert(instance);
        self.instance_mut(parent)?
            .children
            .push((slot.to_string(), child));
        tracing::debug!("Created child {} ({}) in slot {:?} of {}", child, ty.name(), slot, parent);
        Ok(child)
    }

    /// Write a state value, running the update the write calls for
    pub fn set_state(
        &mut self,
        id: InstanceId,
        key: &str,
        value: impl Into<Value>,
    ) -> UiResult<StateWrite> {
        let instance = self.instance_mut(id)?;
        let attachment = instance.attachment();
        let outcome = instance.state.set(key, value.into(), attachment);
        tracing::debug!("State {:?} of {} written: {:?}", key, id, outcome);
        if outcome.is_scheduled() {
            self.update(id)?;
        }
        Ok(outcome)
    }

    /// Write every entry of a JSON object into an instance's state
    pub fn register_state(&mut self, id: InstanceId, state: Value) -> UiResult<()> {
        Context::new(self, id).register_state(state)
    }

    /// Current state value of an instance
    pub fn state(&self, id: InstanceId, key: &str) -> Option<&Value> {
        self.instances.get(id)?.state().get(key)
    }

    /// Re-render and patch an instance
    ///
    /// Children update through their parent. Returns `false` when the root
    /// has no live tree yet.
    pub fn update(&mut self, id: InstanceId) -> UiResult<bool> {
        let instance = self.instance(id)?;
        if let Some(parent) = instance.parent() {
            return self.update(parent);
        }
        let Some(dom) = instance.dom() else {
            return Ok(false);
        };

        let template = self.render_instance(id)?;
        let live = self.reconciler.patch(&mut self.tree, dom, template)?;
        self.instance_mut(id)?.dom = Some(live);
        self.run_hook(id, Hook::Update)?;
        Ok(true)
    }

    /// Live node an instance renders into (its root's for children)
    pub fn root_dom(&self, id: InstanceId) -> Option<NodeId> {
        let instance = self.instances.get(id)?;
        match instance.parent() {
            Some(parent) => self.root_dom(parent),
            None => instance.dom(),
        }
    }

    /// Elements matching `selector` in an instance's tree
    pub fn elements(&self, id: InstanceId, selector: &str) -> UiResult<Vec<NodeId>> {
        let instance = self.instance(id)?;
        if let Some(parent) = instance.parent() {
            return self.elements(parent, selector);
        }
        let Some(dom) = instance.dom() else {
            return Ok(Vec::new());
        };

        if self.tree.text(dom).is_none() {
            let found = self.tree.query_selector_all(dom, selector)?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        match self.tree.parent(dom) {
            Some(container) => Ok(self.tree.query_selector_all(container, selector)?),
            None => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, name: &str, id: InstanceId) -> UiResult<()> {
        self.instance(id)?;
        self.events.subscribe(name, id)
    }

    pub fn unsubscribe(&mut self, name: &str, id: InstanceId) {
        self.events.unsubscribe(name, id);
    }

    /// Deliver an event to every subscriber's `notify`, in subscription order
    pub fn publish(&mut self, name: &str, data: Value) -> UiResult<()> {
        let deliveries = self.events.publish(name, data)?;
        tracing::debug!("Publishing {:?} to {} subscribers", name, deliveries.len());
        for delivery in deliveries {
            let Some(instance) = self.instances.get(delivery.subscriber) else {
                tracing::trace!("Skipping stale subscriber {}", delivery.subscriber);
                continue;
            };
            let component = instance.component();
            let mut cx = Context::new(self, delivery.subscriber);
            component.notify(&mut cx, &delivery.notification)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Declare binding keys
    pub fn set_bindings<S: AsRef<str>>(&mut self, keys: &[S]) {
        self.bindings.set_bindings(keys);
    }

    pub fn binding(&self, key: &str) -> Option<&str> {
        self.bindings.binding(key)
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Input event on a bound element
    pub fn input(&mut self, element: NodeId, value: &str) -> UiResult<usize> {
        self.bindings.input(&mut self.tree, element, value)
    }

    /// Programmatic write of a binding value
    pub fn set_binding(&mut self, key: &str, value: &str) -> UiResult<usize> {
        self.bindings.set_binding(&mut self.tree, key, value)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
