//! Domain types for the synchronization engine with strong typing.
//!
//! Identifiers are wrapped in newtypes so a `SourceId` can never be passed
//! where a `ScanId` is expected.

pub mod clock;
pub mod events;

pub use clock::ProcessClock;

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

id_newtype!(
    /// Unique identifier of a registered library source.
    ///
    /// ```rust
    /// use shelfsync::domain::SourceId;
    ///
    /// let id = SourceId::new(7);
    /// assert_eq!(id.value(), 7);
    /// assert_eq!(id.to_string(), "7");
    /// ```
    SourceId
);

id_newtype!(
    /// Unique identifier of a catalog media record.
    MediaId
);

id_newtype!(
    /// Unique identifier of one scan execution.
    ScanId
);

/// Which scans block a new scan from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleFlightPolicy {
    /// At most one running scan per source.
    #[default]
    PerSource,
    /// At most one running scan across every source.
    Global,
}

impl SingleFlightPolicy {
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_conversions() {
        let id = SourceId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(SourceId::from(42), id);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ScanId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: ScanId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScanId::new(3));
    }

    #[test]
    fn single_flight_policy_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: SingleFlightPolicy,
        }

        let parsed: Wrapper = toml::from_str("policy = \"global\"").unwrap();
        assert!(parsed.policy.is_global());
        assert!(!SingleFlightPolicy::default().is_global());
    }
}
