//! Unique identifier types for exchange entities
//!
//! Entity IDs are UUID v7 newtypes minted through one macro, so all of them
//! share the same surface: time-sortable ordering for chronological queries
//! in the audit log, transparent serde, and Display as the inner UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Define a UUID v7 id newtype with the shared constructor/accessor surface
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh id carrying the current timestamp
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id! {
    /// Unique identifier for an order
    OrderId
}

entity_id! {
    /// Unique identifier for a trade
    TradeId
}

entity_id! {
    /// Unique identifier for a user or trading agent
    UserId
}

/// Ticker symbol for a listed stock
///
/// Format: 1-8 ASCII uppercase letters (e.g., "FUN", "HODL")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Create a new Ticker from a string
    ///
    /// # Panics
    /// Panics if the symbol is empty, longer than 8 characters, or not
    /// ASCII uppercase alphabetic
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::try_new(symbol).expect("Ticker must be 1-8 ASCII uppercase letters")
    }

    /// Try to create a Ticker, returning None if invalid
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() || s.len() > 8 {
            return None;
        }
        if !s.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }
        Some(Self(s))
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
