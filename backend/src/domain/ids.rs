//! Identifier newtypes shared across the domain.
//!
//! User ids originate at the identity provider and are opaque strings;
//! listing and booking ids are generated locally. All three reject empty
//! values at the boundary so the rest of the crate can rely on them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation failure raised when constructing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdValidationError {
    /// The identifier was empty once trimmed.
    #[error("identifier must not be empty")]
    Empty,
}

fn validate(raw: &str) -> Result<(), IdValidationError> {
    if raw.trim().is_empty() {
        return Err(IdValidationError::Empty);
    }
    Ok(())
}

/// Stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let raw = id.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Stable listing identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListingId(String);

impl ListingId {
    /// Validate and construct a [`ListingId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let raw = id.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Stable booking identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingId(String);

impl BookingId {
    /// Validate and construct a [`BookingId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let raw = id.into();
        validate(&raw)?;
        Ok(Self(raw))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

macro_rules! id_conversions {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

id_conversions!(UserId);
id_conversions!(ListingId);
id_conversions!(BookingId);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_ids_are_rejected(#[case] raw: &str) {
        assert_eq!(UserId::new(raw), Err(IdValidationError::Empty));
        assert_eq!(ListingId::new(raw), Err(IdValidationError::Empty));
        assert_eq!(BookingId::new(raw), Err(IdValidationError::Empty));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ListingId::generate(), ListingId::generate());
        assert_ne!(BookingId::generate(), BookingId::generate());
    }

    #[test]
    fn ids_round_trip_through_strings() {
        let id = UserId::new("identity-4821").expect("valid id");
        assert_eq!(id.as_str(), "identity-4821");
        assert_eq!(String::from(id.clone()), "identity-4821");
        assert_eq!(id.to_string(), "identity-4821");
    }
}
