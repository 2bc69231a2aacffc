//! Reconciliation identity tokens.
//!
//! Keys let the reconciler recognise the same logical child across two
//! renders of a list, regardless of where it moved.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::Key;
//!
//! let keyed = Key::new("row-7");
//! assert!(keyed.is_present());
//! assert_eq!(keyed.as_str(), Some("row-7"));
//!
//! // Hosts spell "no key" as the empty string
//! assert!(!Key::new("").is_present());
//! ```

use std::fmt;

/// Identity token attached to a widget or node descriptor.
///
/// An absent key marks the node as unkeyed: unkeyed nodes are only ever
/// matched by position, never by identity search. Equality is by value.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Key {
    value: Option<String>,
}

impl Key {
    /// The absent key.
    pub const fn none() -> Self {
        Self { value: None }
    }

    /// Create a key from a string. The empty string yields the absent key.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::none()
        } else {
            Self { value: Some(value) }
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "Key({value:?})"),
            None => f.write_str("Key(<none>)"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_is_absent() {
        let key = Key::new("");
        assert!(!key.is_present());
        assert_eq!(key, Key::none());
        assert_eq!(key.as_str(), None);
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(Key::new("x"), Key::from("x"));
        assert_ne!(Key::new("x"), Key::new("y"));
        assert_ne!(Key::new("x"), Key::none());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Key::new("a")), "Key(\"a\")");
        assert_eq!(format!("{:?}", Key::none()), "Key(<none>)");
    }
}
