//! UI runtime errors

use fos_dom::DomError;
use fos_html::TemplateError;

use crate::component::InstanceId;

/// Component runtime error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UiError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Container Error: no container matches {0}")]
    ContainerNotFound(String),

    #[error("Component {0} is abstract and cannot be instantiated")]
    AbstractInstantiation(&'static str),

    #[error("Invalid event name {0:?}: must be a non-empty, non-numeric string")]
    InvalidEventName(String),

    #[error("No such event exists: {0}")]
    NoSuchEvent(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Configuration is frozen, cannot modify {0}")]
    ConfigurationImmutable(String),

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Unknown component instance: {0}")]
    UnknownInstance(InstanceId),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Result type for the component runtime
pub type UiResult<T> = Result<T, UiError>;
