//! Trellis Core
//!
//! Retained widget trees driven by component functions with hook state.
//!
//! - **Widgets**: a closed set of kinds living in an arena ([`WidgetTree`])
//!   and recycled through per-kind free lists ([`WidgetPool`])
//! - **Component contexts**: ordered hook slots, pending updates and effects
//!   for one component instance ([`ComponentContext`])
//! - **Reconciliation**: re-running a component against its previous output
//!   while keeping widget handles, hook state and keyed children
//!   ([`reconcile_object`], [`reconcile_widget_holders`])
//! - **Settling**: bounded passes that commit state and re-run dependent
//!   effects in creation order ([`settle`])
//!
//! The core knows nothing about the host language. Component functions,
//! effect callbacks and cleanups are opaque [`HostFunction`]s that an
//! [`Engine`] implementation knows how to invoke.

pub mod context;
pub mod engine;
pub mod error;
pub mod holder;
pub mod key;
pub mod pool;
pub mod props;
pub mod reconcile;
pub mod scheduler;
pub mod tree;
pub mod value;
pub mod widget;

#[cfg(test)]
mod testing;

pub use context::{
    ComponentContext, ContextId, CreationCounter, Dependency, EffectAction, HookKind,
    ReconciliationScope, SetStateAction, StateRef,
};
pub use engine::Engine;
pub use error::{ReconcileError, Result};
pub use holder::{Child, NodeDescriptor, NodeSource};
pub use key::Key;
pub use pool::{PoolStats, WidgetPool};
pub use props::{empty_props, EmptyProps, PropMap, Props};
pub use reconcile::{
    add_static_child, insert_child, is_compatible, longest_increasing_subsequence,
    reconcile_list, reconcile_object, reconcile_widget_holders, ListReconciliation,
};
pub use scheduler::{settle, update_context, SettleReport, UpdateScheduler, DEFAULT_MAX_PASSES};
pub use tree::WidgetTree;
pub use value::{HostFunction, StateValue};
pub use widget::{
    ContainerData, HolderData, ImageData, TextData, Widget, WidgetId, WidgetKind, WidgetPayload,
};
