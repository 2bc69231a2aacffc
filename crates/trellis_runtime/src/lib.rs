//! Trellis Runtime
//!
//! A Rust-native engine for Trellis widget trees. Components are closures,
//! elements are built with a small builder DSL and state is read and written
//! through typed handles.
//!
//! ```ignore
//! use trellis_runtime::prelude::*;
//!
//! let counter = Component::new(|rt, _props, _children| {
//!     let (_, count) = rt.use_state(0i32)?;
//!     let label = rt.element(text("Count: "))?;
//!     rt.use_effect(
//!         move |rt| {
//!             let value = rt.get(count)?;
//!             rt.insert_text(label, "value", &value.to_string())?;
//!             Ok(None)
//!         },
//!         vec![count.dep()],
//!     )?;
//!     let root = rt.element(view())?;
//!     rt.add_child(root, label)?;
//!     Ok(root)
//! });
//!
//! let mut rt = Runtime::new();
//! rt.render(Element::component(&counter))?;
//! println!("{}", rt.describe());
//! ```

pub mod component;
pub mod config;
pub mod element;
pub mod props;
pub mod runtime;
pub mod state;

pub use component::{Cleanup, Component};
pub use config::{ConfigError, RuntimeConfig};
pub use element::{button, holder, image, text, view, Element, ElementChild};
pub use props::{PropValue, PropValues};
pub use runtime::{Runtime, RuntimeStats};
pub use state::{value_dep, StateHandle, StateType};

pub use trellis_core;
pub use trellis_core::{
    Child, Dependency, Engine, Key, ListReconciliation, PropMap, Props, ReconcileError, Result,
    SettleReport, WidgetId, WidgetKind,
};

/// Everything needed to write components
pub mod prelude {
    pub use crate::{
        button, holder, image, text, value_dep, view, Cleanup, Component, Element, PropMap,
        PropValues, Runtime, StateHandle,
    };
    pub use trellis_core::Engine;
}
