//! fOS UI - Component runtime
//!
//! Renders templates into a live document tree, keeps it in sync with
//! component state through a positional reconciler, and coordinates
//! components with lifecycle hooks and a publish/subscribe bus.
//!
//! Everything is synchronous and single-threaded: a state write that calls
//! for an update has rendered, patched and run `on_update` before it returns.

pub mod app;
pub mod bindings;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod globals;
pub mod mount;
pub mod reconcile;
pub mod registry;
pub mod state;

pub use app::{App, RenderSource};
pub use bindings::BindingTable;
pub use component::{BaseComponent, Component, ComponentArena, ComponentType, Instance, InstanceId, Props};
pub use config::Config;
pub use context::Context;
pub use error::{UiError, UiResult};
pub use events::{Delivery, EventBus, Notification};
pub use globals::Globals;
pub use mount::{MountTarget, Mountable};
pub use reconcile::{PatchStats, Reconciler, Renderable};
pub use registry::{ComponentRegistry, Gate, Middleware, Registration};
pub use state::{Attachment, ReactiveState, StateWrite};

pub use fos_dom::{DomTree, NodeId};
pub use fos_html::{Template, TemplateError, TreeBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
