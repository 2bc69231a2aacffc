//! Type-erased values that cross the engine boundary.
//!
//! [`StateValue`] is what a hook slot holds. It is shareable, comparable and
//! printable without the core knowing the concrete type. [`HostFunction`] is
//! an opaque callable owned by the host (component functions, effect
//! callbacks, cleanups); the core only stores it and hands it back.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

trait AnyValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_dyn(&self, other: &dyn AnyValue) -> bool;
    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> AnyValue for T
where
    T: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn AnyValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A value stored in a hook slot.
///
/// Cloning shares the underlying allocation. Two values are equal when they
/// share an allocation or when their concrete types match and compare equal.
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn AnyValue>,
}

impl StateValue {
    pub fn new<T>(value: T) -> Self
    where
        T: PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(value),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    pub fn is<T: 'static>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    /// True when both values share one allocation.
    pub fn ptr_eq(&self, other: &StateValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for StateValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (*self.inner).eq_dyn(&*other.inner)
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.inner).fmt_dyn(f)
    }
}

/// An opaque callable owned by the host.
///
/// The engine that created it is the only party that knows the concrete
/// type and downcasts it back when asked to invoke it.
#[derive(Clone)]
pub struct HostFunction {
    inner: Rc<dyn Any>,
}

impl HostFunction {
    pub fn new<F: 'static>(function: F) -> Self {
        Self {
            inner: Rc::new(function),
        }
    }

    pub fn downcast_ref<F: 'static>(&self) -> Option<&F> {
        self.inner.downcast_ref::<F>()
    }

    /// Identity comparison, used to tell whether two descriptors name the same component.
    pub fn ptr_eq(&self, other: &HostFunction) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFunction({:p})", Rc::as_ptr(&self.inner) as *const ())
    }
}
