//! Error types for trellis_core

use thiserror::Error;

use crate::context::{ContextId, HookKind};
use crate::widget::{WidgetId, WidgetKind};

/// Errors raised while building, updating or reconciling a widget tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// A hook or widget was created while no component was rendering
    #[error("no active component: hooks and widgets must be created from a component rendered through the engine")]
    NoActiveComponent,

    /// `createComponent` received a type name outside the known set
    #[error("unknown widget type: {0}")]
    UnknownWidgetType(String),

    /// A structural operation was applied to a widget kind that does not support it
    #[error("cannot {operation} on a {kind:?} widget")]
    InvalidOperation {
        operation: &'static str,
        kind: WidgetKind,
    },

    /// Hooks were called in a different order than on mount
    #[error("hook #{index} was {expected:?} on mount but is now called as {found:?}")]
    HookOrderViolation {
        index: usize,
        expected: Option<HookKind>,
        found: HookKind,
    },

    /// A typed read found a value of another type in the slot
    #[error("state slot #{slot} holds a value of a different type")]
    StateTypeMismatch { slot: usize },

    /// The handle refers to a widget that has been torn down
    #[error("widget {0:?} is no longer part of the tree")]
    StaleWidget(WidgetId),

    /// The handle refers to a context that has been released
    #[error("component context {0:?} has been released")]
    StaleContext(ContextId),

    /// Positional child access past the end of a container
    #[error("child index {index} out of bounds for container with {len} children")]
    ChildOutOfBounds { index: usize, len: usize },

    /// Error raised by the host while invoking a component, effect or cleanup
    #[error("host error: {0}")]
    Host(String),
}

/// Result type for trellis_core operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
