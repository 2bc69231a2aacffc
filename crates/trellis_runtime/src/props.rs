//! Typed property values for elements built in Rust.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use trellis_core::{PropMap, Props};

/// A single property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<PropValue>),
    Object(PropValues),
}

impl PropValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

impl From<PropValues> for PropValue {
    fn from(value: PropValues) -> Self {
        PropValue::Object(value)
    }
}

impl<T: Into<PropValue>> From<Vec<T>> for PropValue {
    fn from(items: Vec<T>) -> Self {
        PropValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// A string-keyed property map.
///
/// This is the concrete [`PropMap`] behind every element built with the
/// runtime. Components that need more than the scalar getters can recover it
/// from their [`Props`] with [`PropValues::from_props`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropValues {
    entries: FxHashMap<String, PropValue>,
}

impl PropValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_props(self) -> Props {
        Arc::new(self)
    }

    /// The typed map behind `props`, if it was built by this runtime.
    pub fn from_props(props: &Props) -> Option<&PropValues> {
        props.as_any().downcast_ref::<PropValues>()
    }
}

impl PropMap for PropValues {
    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropValue::as_number)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(PropValue::as_str).map(str::to_owned)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(PropValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    fn get_object(&self, key: &str) -> Option<Props> {
        match self.get(key) {
            Some(PropValue::Object(object)) => Some(object.clone().into_props()),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
