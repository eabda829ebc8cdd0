//! Component model
//!
//! Components are shared (`Rc<dyn Component>`) behaviour objects. Their data
//! (props, reactive state, live node, child slots) lives in an [`Instance`]
//! stored in the app's [`ComponentArena`], so hooks can freely write state
//! and re-render the component that is currently running.

use std::fmt;
use std::rc::Rc;

use fos_dom::NodeId;
use fos_html::Template;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::events::Notification;
use crate::state::{Attachment, ReactiveState};
use crate::{UiError, UiResult};

/// Component properties
pub type Props = Map<String, Value>;

/// A UI component
///
/// Lifecycle hooks default to running the same hook on every child, in slot
/// creation order. Overrides should call `cx.pre_load_children()` (and the
/// matching helpers) first to keep that behaviour.
pub trait Component {
    /// Construct the component from its props
    fn create(props: &Props) -> Self
    where
        Self: Sized;

    /// Abstract components cannot be mounted
    fn is_abstract() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Produce the component's template
    fn render(&self, cx: &mut Context<'_>) -> UiResult<Template>;

    /// Runs after the first build, before insertion into the document
    fn pre_load(&self, cx: &mut Context<'_>) -> UiResult<()> {
        cx.pre_load_children()
    }

    /// Runs after insertion into the document
    fn on_load(&self, cx: &mut Context<'_>) -> UiResult<()> {
        cx.on_load_children()
    }

    /// Runs after every patch of the live tree
    fn on_update(&self, cx: &mut Context<'_>) -> UiResult<()> {
        cx.on_update_children()
    }

    /// Receives published events the component subscribed to
    fn notify(&self, cx: &mut Context<'_>, notification: &Notification) -> UiResult<()> {
        let _ = (cx, notification);
        Ok(())
    }
}

/// Abstract base component
///
/// Renders nothing; mounting it fails with `AbstractInstantiation`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseComponent;

impl Component for BaseComponent {
    fn create(_props: &Props) -> Self {
        Self
    }

    fn is_abstract() -> bool {
        true
    }

    fn render(&self, _cx: &mut Context<'_>) -> UiResult<Template> {
        Ok(Template::empty())
    }
}

fn create_component<C: Component + 'static>(props: &Props) -> Rc<dyn Component> {
    Rc::new(C::create(props))
}

/// Copyable component descriptor
#[derive(Clone, Copy)]
pub struct ComponentType {
    name: &'static str,
    is_abstract: bool,
    create: fn(&Props) -> Rc<dyn Component>,
}

impl ComponentType {
    /// Descriptor of a component type
    pub fn of<C: Component + 'static>() -> Self {
        let full = std::any::type_name::<C>();
        Self {
            name: full.rsplit("::").next().unwrap_or(full),
            is_abstract: C::is_abstract(),
            create: create_component::<C>,
        }
    }

    /// Short type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Create a component object
    pub fn instantiate(&self, props: &Props) -> UiResult<Rc<dyn Component>> {
        if self.is_abstract {
            return Err(UiError::AbstractInstantiation(self.name));
        }
        Ok((self.create)(props))
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("is_abstract", &self.is_abstract)
            .finish()
    }
}

/// Component instance identifier (arena index plus slot generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}v{}", self.index, self.generation)
    }
}

/// Data of one component instance
pub struct Instance {
    component: Rc<dyn Component>,
    ty: ComponentType,
    pub(crate) props: Props,
    pub(crate) state: ReactiveState,
    pub(crate) dom: Option<NodeId>,
    pub(crate) children: Vec<(String, InstanceId)>,
    pub(crate) parent: Option<InstanceId>,
}

impl Instance {
    pub(crate) fn new(ty: ComponentType, component: Rc<dyn Component>, props: Props) -> Self {
        Self {
            component,
            ty,
            props,
            state: ReactiveState::new(),
            dom: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub(crate) fn component(&self) -> Rc<dyn Component> {
        Rc::clone(&self.component)
    }

    pub fn component_type(&self) -> ComponentType {
        self.ty
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn state(&self) -> &ReactiveState {
        &self.state
    }

    /// Live node of a mounted root instance
    pub fn dom(&self) -> Option<NodeId> {
        self.dom
    }

    /// Child instances in slot creation order
    pub fn children(&self) -> &[(String, InstanceId)] {
        &self.children
    }

    /// Child in a named slot
    pub fn child(&self, slot: &str) -> Option<InstanceId> {
        self.children
            .iter()
            .find(|(name, _)| name == slot)
            .map(|&(_, id)| id)
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// How state writes on this instance are treated
    pub fn attachment(&self) -> Attachment {
        if self.is_child() {
            Attachment::Child
        } else if self.dom.is_some() {
            Attachment::Mounted
        } else {
            Attachment::Detached
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("ty", &self.ty)
            .field("props", &self.props)
            .field("state", &self.state)
            .field("dom", &self.dom)
            .field("children", &self.children)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Generational arena of component instances
#[derive(Debug, Default)]
pub struct ComponentArena {
    slots: Vec<(u32, Option<Instance>)>,
    free_list: Vec<u32>,
}

impl ComponentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert instance
    pub fn insert(&mut self, instance: Instance) -> InstanceId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.1 = Some(instance);
            InstanceId::new(index, slot.0)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push((0, Some(instance)));
            InstanceId::new(index, 0)
        }
    }

    /// Get instance
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.slots
            .get(id.index as usize)
            .filter(|(generation, _)| *generation == id.generation)
            .and_then(|(_, instance)| instance.as_ref())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|(generation, _)| *generation == id.generation)
            .and_then(|(_, instance)| instance.as_mut())
    }

    /// Remove instance; its id becomes stale
    pub fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.0 != id.generation {
            return None;
        }
        let instance = slot.1.take()?;
        slot.0 = slot.0.wrapping_add(1);
        self.free_list.push(id.index);
        Some(instance)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of all live instances
    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, (_, instance))| instance.is_some())
            .map(|(index, (generation, _))| InstanceId::new(index as u32, *generation))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|(_, i)| i.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label;

    impl Component for Label {
        fn create(_props: &Props) -> Self {
            Label
        }

        fn render(&self, _cx: &mut Context<'_>) -> UiResult<Template> {
            Ok("<label></label>".into())
        }
    }

    fn instance<C: Component + 'static>() -> Instance {
        let ty = ComponentType::of::<C>();
        let component = ty.instantiate(&Props::new()).unwrap();
        Instance::new(ty, component, Props::new())
    }

    #[test]
    fn test_component_type() {
        let ty = ComponentType::of::<Label>();
        assert_eq!(ty.name(), "Label");
        assert!(!ty.is_abstract());
        assert!(ty.instantiate(&Props::new()).is_ok());
    }

    #[test]
    fn test_base_component_is_abstract() {
        let ty = ComponentType::of::<BaseComponent>();
        assert!(ty.is_abstract());
        assert!(matches!(
            ty.instantiate(&Props::new()),
            Err(UiError::AbstractInstantiation("BaseComponent"))
        ));
    }

    #[test]
    fn test_arena_generations() {
        let mut arena = ComponentArena::new();
        let a = arena.insert(instance::<Label>());
        assert!(arena.contains(a));

        arena.remove(a);
        assert!(!arena.contains(a));
        assert!(arena.remove(a).is_none());

        let b = arena.insert(instance::<Label>());
        assert_ne!(a, b);
        assert_eq!(arena.ids().collect::<Vec<_>>(), vec![b]);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_attachment() {
        let mut inst = instance::<Label>();
        assert_eq!(inst.attachment(), Attachment::Detached);
        inst.dom = Some(NodeId::ROOT);
        assert_eq!(inst.attachment(), Attachment::Mounted);
        inst.parent = Some(InstanceId::new(3, 0));
        assert_eq!(inst.attachment(), Attachment::Child);
    }
}
