//! Rust closures as host functions.
//!
//! The core sees components, effects and cleanups as opaque
//! [`HostFunction`]s. The runtime stores boxed closures in them and
//! downcasts back when the core asks it to call one.

use std::cell::RefCell;
use std::fmt;

use trellis_core::{Child, HostFunction, Props, Result, WidgetId};

use crate::runtime::Runtime;

pub(crate) type ComponentFn = Box<dyn Fn(&mut Runtime, &Props, Vec<Child>) -> Result<WidgetId>>;
pub(crate) type EffectFn = Box<dyn Fn(&mut Runtime) -> Result<Option<Cleanup>>>;
pub(crate) type CleanupFn = RefCell<Option<Box<dyn FnOnce(&mut Runtime)>>>;

/// A component function.
///
/// Identity matters: reconciliation only reuses a widget rendered by the
/// same component, so build each component once and clone the handle.
#[derive(Clone)]
pub struct Component {
    function: HostFunction,
}

impl Component {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&mut Runtime, &Props, Vec<Child>) -> Result<WidgetId> + 'static,
    {
        Self {
            function: HostFunction::new::<ComponentFn>(Box::new(function)),
        }
    }

    pub fn host_function(&self) -> &HostFunction {
        &self.function
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        self.function.ptr_eq(&other.function)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.function).finish()
    }
}

/// Teardown returned by an effect; runs at most once.
pub struct Cleanup {
    function: HostFunction,
}

impl Cleanup {
    pub fn new(function: impl FnOnce(&mut Runtime) + 'static) -> Self {
        let boxed: Box<dyn FnOnce(&mut Runtime)> = Box::new(function);
        Self {
            function: HostFunction::new::<CleanupFn>(RefCell::new(Some(boxed))),
        }
    }

    pub(crate) fn into_host_function(self) -> HostFunction {
        self.function
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cleanup").field(&self.function).finish()
    }
}

pub(crate) fn effect_function<F>(effect: F) -> HostFunction
where
    F: Fn(&mut Runtime) -> Result<Option<Cleanup>> + 'static,
{
    HostFunction::new::<EffectFn>(Box::new(effect))
}
