use serde::{Deserialize, Serialize};
use std::fmt;

/// One component of a composite store key
///
/// Components are totally ordered (integers before strings before
/// booleans, then by value) so that keys sharing a prefix sort into one
/// contiguous run, the property prefix scans rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Int(v) => write!(f, "{}", v),
            KeyPart::Str(v) => write!(f, "{}", v),
            KeyPart::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

/// Composite store key - an ordered sequence of components
///
/// Keys compare lexicographically component by component, so every key
/// extending a prefix `p` sorts at or after `p` and before any key that
/// diverges from `p`; a range scan starting at `p` enumerates exactly
/// the keys `starts_with(p)` accepts, contiguously.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Key(Vec<KeyPart>);

impl Key {
    /// Create an empty key
    pub fn new() -> Self {
        Key(Vec::new())
    }

    /// Create a key from a sequence of components
    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }

    /// Append a component
    pub fn push(&mut self, part: KeyPart) {
        self.0.push(part);
    }

    /// The ordered components of this key
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this key begins with every component of `prefix`, in order
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl From<Vec<KeyPart>> for Key {
    fn from(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }
}

impl fmt::Display for Key {
    /// Renders as `[user,1234]`, the form used in error messages
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_with() {
        let prefix = Key::from_parts(vec!["user".into()]);
        let full = Key::from_parts(vec!["user".into(), "1234".into()]);

        assert!(full.starts_with(&prefix));
        assert!(full.starts_with(&full));
        assert!(!prefix.starts_with(&full));

        let other = Key::from_parts(vec!["book".into(), "1234".into()]);
        assert!(!other.starts_with(&prefix));
    }

    #[test]
    fn test_display_bracketed() {
        let key = Key::from_parts(vec!["user".into(), "1234".into()]);
        assert_eq!(key.to_string(), "[user,1234]");

        let mixed = Key::from_parts(vec!["order".into(), KeyPart::Int(7), KeyPart::Bool(true)]);
        assert_eq!(mixed.to_string(), "[order,7,true]");
    }

    #[test]
    fn test_extension_sorts_after_prefix() {
        let prefix = Key::from_parts(vec!["user".into()]);
        let extended = Key::from_parts(vec!["user".into(), "a".into()]);
        assert!(extended > prefix);
    }

    fn arb_part() -> impl Strategy<Value = KeyPart> {
        prop_oneof![
            any::<i64>().prop_map(KeyPart::Int),
            "[a-z]{0,8}".prop_map(KeyPart::Str),
            any::<bool>().prop_map(KeyPart::Bool),
        ]
    }

    proptest! {
        /// Any key not extending a prefix compares on the prefix's own
        /// components, so extensions of the prefix form one contiguous
        /// run in sorted order.
        #[test]
        fn prop_prefix_run_is_contiguous(
            prefix in proptest::collection::vec(arb_part(), 1..4),
            suffix in proptest::collection::vec(arb_part(), 0..3),
            other in proptest::collection::vec(arb_part(), 1..6),
        ) {
            let prefix = Key::from_parts(prefix);
            let mut extended = prefix.clone();
            for part in suffix {
                extended.push(part);
            }
            let other = Key::from_parts(other);

            prop_assert!(extended.starts_with(&prefix));
            prop_assert!(extended >= prefix);
            if other >= prefix && !other.starts_with(&prefix) {
                // a non-extension at or after the prefix sorts after
                // every extension
                prop_assert!(other > extended);
            }
        }
    }
}
