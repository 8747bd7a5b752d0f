//! Identifier newtypes shared across TrueTrack crates.
//!
//! Every identifier is a UUID v4 rendered as a string. Parsing validates the
//! UUID shape so ids coming back from audit files or `--json` output can be
//! trusted to round-trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when an identifier string is not a valid UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    label: &'static str,
    reason: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.label, self.reason)
    }
}

impl std::error::Error for IdParseError {}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                let uuid = Uuid::parse_str(value).map_err(|e| IdParseError {
                    label: $label,
                    reason: e.to_string(),
                })?;
                Ok(Self(uuid.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First eight characters, for status lines and table cells.
            pub fn short(&self) -> &str {
                &self.0[..8]
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(
    /// One user-initiated scan attempt.
    SessionId,
    "session ID"
);
uuid_id!(
    /// A counterfeit report filed from a verification result.
    ReportId,
    "report ID"
);
uuid_id!(
    /// A retailer alert raised by a suspicious or counterfeit scan.
    AlertId,
    "alert ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case() {
        let upper = "67E55044-10B1-426F-9247-BB680E5FE0C8";
        let id = SessionId::parse(upper).unwrap();
        assert_eq!(id.as_str(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ReportId::parse("TT-123").unwrap_err();
        assert!(err.to_string().starts_with("invalid report ID"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = AlertId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        assert_eq!(id.short().len(), 8);
    }
}
