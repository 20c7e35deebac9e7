//! Strongly-typed identifiers for billing entities
//!
//! Bill and customer identifiers are externally visible strings (a manually
//! created bill may carry any non-blank id), so the newtypes wrap `String`
//! rather than a bare UUID. A bill id also names its invoice file, so ids
//! never contain path separators, `..` or control characters. Generated
//! identifiers use UUIDv7, which keeps them time-ordered without depending on
//! clock granularity for uniqueness.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

fn is_path_safe(value: &str) -> bool {
    !value.contains("..")
        && !value
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

macro_rules! define_key {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh, time-ordered identifier
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Wraps an existing identifier, rejecting blank values and
            /// anything that could act as a path
            pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::invalid_identifier(
                        stringify!($name),
                        "must not be blank",
                    ));
                }
                if !is_path_safe(trimmed) {
                    return Err(CoreError::invalid_identifier(
                        stringify!($name),
                        format!(
                            "'{}' contains '/', '\\', '..' or control characters",
                            trimmed.escape_default()
                        ),
                    ));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the prefix used for generated identifiers
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }
    };
}

define_key!(CustomerId, "CUS");
define_key!(BillId, "BILL");
define_key!(PaymentId, "PAY");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_prefix() {
        assert!(BillId::generate().as_str().starts_with("BILL-"));
        assert!(PaymentId::generate().as_str().starts_with("PAY-"));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = PaymentId::generate();
        let b = PaymentId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(BillId::parse("  B1 ").unwrap().as_str(), "B1");
        assert!(BillId::parse("   ").is_err());
        assert!("".parse::<CustomerId>().is_err());
    }

    #[test]
    fn test_parse_rejects_path_like_ids() {
        for bad in ["../escaped", "a/b", "a\\b", "..", "BILL\n1", "x\u{0}y"] {
            assert!(BillId::parse(bad).is_err(), "accepted {:?}", bad);
        }
        assert!(BillId::parse("BILL-AUG-C1").is_ok());
        assert!(BillId::parse("BILL.2025.09").is_ok());
    }

    #[test]
    fn test_deserialize_goes_through_parse() {
        let id: BillId = serde_json::from_str("\"BILL-1\"").unwrap();
        assert_eq!(id.as_str(), "BILL-1");
        assert!(serde_json::from_str::<BillId>("\"../x\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"BILL-1\"");
    }
}
