//! Component registry
//!
//! Maps names to component types, each optionally guarded by a render gate
//! (middleware). A gate is a predicate over the app globals; when it returns
//! false the component is not mounted.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::component::ComponentType;
use crate::globals::Globals;
use crate::{UiError, UiResult};

/// Render gate predicate
pub type Middleware = Rc<dyn Fn(&Globals) -> bool>;

/// Gate attached to a registration
#[derive(Clone)]
pub enum Gate {
    /// Middleware looked up by name when the component is rendered
    Named(String),
    /// Inline predicate
    Inline(Middleware),
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// A named component
#[derive(Debug, Clone)]
pub struct Registration {
    pub ty: ComponentType,
    pub gate: Option<Gate>,
}

/// Component names and middleware
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Registration>,
    middlewares: HashMap<String, Middleware>,
    frozen: bool,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_frozen(&self, what: &str) -> UiResult<()> {
        if self.frozen {
            return Err(UiError::ConfigurationImmutable(what.to_string()));
        }
        Ok(())
    }

    /// Register a component under a name
    ///
    /// The first registration of a name wins; later ones are ignored and
    /// reported as `Ok(false)`.
    pub fn name_component(
        &mut self,
        name: &str,
        ty: ComponentType,
        gate: Option<Gate>,
    ) -> UiResult<bool> {
        self.check_frozen("component registry")?;
        if self.components.contains_key(name) {
            tracing::warn!("Component name {:?} already registered, ignoring {}", name, ty.name());
            return Ok(false);
        }
        tracing::debug!("Registered component {:?} ({})", name, ty.name());
        self.components
            .insert(name.to_string(), Registration { ty, gate });
        Ok(true)
    }

    /// Create a named middleware; an existing one is kept
    pub fn create_middleware(
        &mut self,
        name: &str,
        action: impl Fn(&Globals) -> bool + 'static,
    ) -> UiResult<()> {
        self.check_frozen("middleware")?;
        if self.middlewares.contains_key(name) {
            tracing::warn!("Middleware {:?} already exists, ignoring", name);
            return Ok(());
        }
        self.middlewares.insert(name.to_string(), Rc::new(action));
        Ok(())
    }

    /// Get a named middleware
    pub fn middleware(&self, name: &str) -> Option<Middleware> {
        self.middlewares.get(name).cloned()
    }

    /// Registration of a name
    pub fn resolve(&self, name: &str) -> UiResult<&Registration> {
        self.components
            .get(name)
            .ok_or_else(|| UiError::UnknownComponent(name.to_string()))
    }

    /// Whether the gate of a registration lets it render
    ///
    /// A named gate that does not exist keeps the component withheld.
    pub fn allows(&self, registration: &Registration, globals: &Globals) -> bool {
        match &registration.gate {
            None => true,
            Some(Gate::Inline(action)) => action(globals),
            Some(Gate::Named(name)) => match self.middlewares.get(name) {
                Some(action) => action(globals),
                None => {
                    tracing::warn!("Middleware {:?} does not exist", name);
                    false
                }
            },
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Seal the registry
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.components)
            .field("middlewares", &self.middlewares.keys().collect::<Vec<_>>())
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{BaseComponent, Component, Props};
    use crate::context::Context;
    use fos_html::Template;
    use serde_json::json;

    struct Panel;

    impl Component for Panel {
        fn create(_props: &Props) -> Self {
            Panel
        }

        fn render(&self, _cx: &mut Context<'_>) -> UiResult<Template> {
            Ok("<div></div>".into())
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = ComponentRegistry::new();
        assert!(registry
            .name_component("panel", ComponentType::of::<Panel>(), None)
            .unwrap());
        assert!(!registry
            .name_component("panel", ComponentType::of::<BaseComponent>(), None)
            .unwrap());
        assert_eq!(registry.resolve("panel").unwrap().ty.name(), "Panel");
    }

    #[test]
    fn test_unknown_component() {
        let registry = ComponentRegistry::new();
        assert!(matches!(
            registry.resolve("missing"),
            Err(UiError::UnknownComponent(_))
        ));
    }

    #[test]
    fn test_named_gate() {
        let mut registry = ComponentRegistry::new();
        registry
            .create_middleware("auth", |g| g.get("user").is_some())
            .unwrap();
        registry
            .name_component(
                "panel",
                ComponentType::of::<Panel>(),
                Some(Gate::Named("auth".into())),
            )
            .unwrap();

        let mut globals = Globals::new();
        let registration = registry.resolve("panel").unwrap().clone();
        assert!(!registry.allows(&registration, &globals));
        globals.set("user", json!("ada")).unwrap();
        assert!(registry.allows(&registration, &globals));
    }

    #[test]
    fn test_missing_named_gate_withholds() {
        let mut registry = ComponentRegistry::new();
        registry
            .name_component("p", ComponentType::of::<Panel>(), Some(Gate::Named("nope".into())))
            .unwrap();
        let registration = registry.resolve("p").unwrap().clone();
        assert!(!registry.allows(&registration, &Globals::new()));
    }

    #[test]
    fn test_frozen_registry() {
        let mut registry = ComponentRegistry::new();
        registry.freeze();
        assert!(matches!(
            registry.name_component("p", ComponentType::of::<Panel>(), None),
            Err(UiError::ConfigurationImmutable(_))
        ));
        assert!(registry.create_middleware("m", |_| true).is_err());
    }
}
