//! Typed handles over hook state slots.

use std::fmt;
use std::marker::PhantomData;

use trellis_core::{Dependency, StateRef, StateValue};

/// Values that can live in a state slot
pub trait StateType: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> StateType for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// A state slot known to hold a `T`.
///
/// Handles are `Copy` and outlive the render that created them, so effects
/// and event code can capture them freely.
pub struct StateHandle<T> {
    state: StateRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: StateType> StateHandle<T> {
    pub(crate) fn new(state: StateRef) -> Self {
        Self {
            state,
            _marker: PhantomData,
        }
    }

    pub fn state_ref(&self) -> StateRef {
        self.state
    }

    /// Dependency on this slot, for an effect's dependency list
    pub fn dep(&self) -> Dependency {
        Dependency::State(self.state)
    }
}

impl<T> Clone for StateHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateHandle<T> {}

impl<T> PartialEq for StateHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<T> Eq for StateHandle<T> {}

impl<T> fmt::Debug for StateHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("context", &self.state.context)
            .field("slot", &self.state.slot)
            .finish()
    }
}

impl<T> From<StateHandle<T>> for Dependency {
    fn from(handle: StateHandle<T>) -> Self {
        Dependency::State(handle.state)
    }
}

/// Dependency on a plain value captured at render time.
///
/// Only state dependencies trigger re-runs while settling; a value
/// dependency keeps the list non-empty so the effect re-runs on re-render.
pub fn value_dep<T: StateType>(value: T) -> Dependency {
    Dependency::Value(StateValue::new(value))
}
