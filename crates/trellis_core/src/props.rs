//! Read-only property maps.
//!
//! Props are produced by the host and only ever read by the core. The core
//! looks at `style` (kept for styling) and `src` (image source); everything
//! else is passed back to the host untouched.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A host-provided property mapping.
pub trait PropMap: Send + Sync + fmt::Debug {
    fn has(&self, key: &str) -> bool;

    fn get_number(&self, key: &str) -> Option<f64>;

    fn get_string(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Nested object, such as `style`
    fn get_object(&self, key: &str) -> Option<Props>;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a prop map
pub type Props = Arc<dyn PropMap>;

/// A prop map with no entries
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProps;

impl PropMap for EmptyProps {
    fn has(&self, _key: &str) -> bool {
        false
    }

    fn get_number(&self, _key: &str) -> Option<f64> {
        None
    }

    fn get_string(&self, _key: &str) -> Option<String> {
        None
    }

    fn get_bool(&self, _key: &str) -> Option<bool> {
        None
    }

    fn get_object(&self, _key: &str) -> Option<Props> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn empty_props() -> Props {
    Arc::new(EmptyProps)
}
