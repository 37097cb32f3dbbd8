//! Catalog identifiers
//!
//! Every catalog row is addressed by a short slug such as `flour`,
//! `sponge-cake` or `addon.7`. Slugs are ASCII alphanumerics plus `-`, `_`
//! and `.`, so they survive JSONL, SQLite and shell arguments unchanged.
//!
//! Each row kind gets its own newtype so an item id can never be passed
//! where a material id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("{kind} ID must not be empty")]
    Empty { kind: &'static str },

    #[error("Invalid {kind} ID '{value}': only letters, digits, '-', '_' and '.' are allowed")]
    InvalidCharacter { kind: &'static str, value: String },

    #[error("Size tag must not be empty")]
    EmptySize,
}

fn validate(kind: &'static str, raw: &str) -> Result<String, IdError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(IdError::Empty { kind });
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(IdError::InvalidCharacter {
            kind,
            value: value.to_string(),
        });
    }

    Ok(value.to_string())
}

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated ID
            pub fn new(value: impl AsRef<str>) -> Result<Self, IdError> {
                validate($kind, value.as_ref()).map(Self)
            }

            /// Returns the ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

catalog_id!(
    /// Identifier of a raw inventory item (flour, eggs, boxes)
    ItemId,
    "item"
);

catalog_id!(
    /// Identifier of a composite material (a recipe)
    MaterialId,
    "material"
);

catalog_id!(
    /// Identifier of a sellable product
    ProductId,
    "product"
);

catalog_id!(
    /// Identifier of an optional add-on
    AddOnId,
    "add-on"
);

/// A product size tag such as `Large` or `6-inch`
///
/// Sizes are free text chosen by the catalog; they are trimmed but
/// otherwise compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(IdError::EmptySize);
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Size {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Size {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_slugs() {
        let id: MaterialId = "sponge-cake".parse().unwrap();
        assert_eq!(id.as_str(), "sponge-cake");
        assert_eq!(id.to_string(), "sponge-cake");

        let id = AddOnId::new("addon.7").unwrap();
        assert_eq!(id.as_str(), "addon.7");
    }

    #[test]
    fn trims_whitespace() {
        let id = ItemId::new("  flour ").unwrap();
        assert_eq!(id.as_str(), "flour");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ItemId::new("   "), Err(IdError::Empty { kind: "item" }));
    }

    #[test]
    fn rejects_invalid_characters() {
        let err = ProductId::new("birthday cake").unwrap_err();
        assert!(matches!(err, IdError::InvalidCharacter { kind: "product", .. }));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = MaterialId::new("batter").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"batter\"");

        let parsed: MaterialId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn deserialization_validates() {
        let result: Result<ItemId, _> = serde_json::from_str("\"bad id\"");
        assert!(result.is_err());
    }

    #[test]
    fn size_is_compared_exactly() {
        let large = Size::new(" Large ").unwrap();
        assert_eq!(large.as_str(), "Large");
        assert_ne!(large, Size::new("large").unwrap());
        assert_eq!(Size::new(""), Err(IdError::EmptySize));
    }
}
