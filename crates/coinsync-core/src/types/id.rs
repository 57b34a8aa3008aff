//! Newtype wrappers around store-assigned string keys.
//!
//! The store hands out opaque string identifiers for documents and
//! sessions. Distinct types keep a package key from being used where an
//! identity key is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype key wrapper around `String`.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw key.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_key!(
    /// Store-assigned identifier of a package document.
    PackageId
);

define_key!(
    /// Store-issued identifier of a (possibly anonymous) session identity.
    IdentityId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_raw_key() {
        let id = PackageId::new("pkg_42");
        assert_eq!(id.to_string(), "pkg_42");
        assert_eq!(id.as_str(), "pkg_42");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = IdentityId::from("anon-1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"anon-1\"");
    }
}
