//! Global values and modules
//!
//! Process-wide key/value registry shared by components. Sealed by
//! `App::freeze`.

use serde_json::{Map, Value};

use crate::{UiError, UiResult};

/// Global key/value registry
#[derive(Debug, Clone, Default)]
pub struct Globals {
    values: Map<String, Value>,
    modules: Map<String, Value>,
    frozen: bool,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a global value
    pub fn set(&mut self, key: &str, value: Value) -> UiResult<()> {
        if self.frozen {
            return Err(UiError::ConfigurationImmutable(format!("global {key:?}")));
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Get a global value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Register a module; modules are objects and are never overwritten
    pub fn register_module(&mut self, name: &str, module: Value) -> UiResult<()> {
        if self.frozen {
            return Err(UiError::ConfigurationImmutable(format!("module {name:?}")));
        }
        if !module.is_object() {
            return Err(UiError::TypeMismatch(format!("module {name} must be an object")));
        }
        if self.modules.contains_key(name) {
            return Err(UiError::TypeMismatch(format!("module {name} already exists")));
        }
        self.modules.insert(name.to_string(), module);
        Ok(())
    }

    pub fn module(&self, name: &str) -> Option<&Value> {
        self.modules.get(name)
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
