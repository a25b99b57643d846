//! Ordering tuning values.
//!
//! # Invariants
//! - `min_gap >= 1` and `default_gap >= 1`.
//! - `rebalance_gap > min_gap`, so respaced neighbors are never exhausted.
//! - `first_position > min_gap`, so insert-first after a rebalance lands
//!   strictly below the respaced entries.
//! - These hold for every `OrderingConfig` value; there is no unchecked
//!   constructor.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised while building an ordering configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A tuning value violates its constraint.
    Invalid {
        field: &'static str,
        value: i64,
        reason: &'static str,
    },
    /// Input could not be parsed as a configuration document.
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid {
                field,
                value,
                reason,
            } => write!(f, "invalid ordering config `{field}={value}`: {reason}"),
            Self::Parse(err) => write!(f, "unparsable ordering config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Gap and origin values used by the allocator and executors.
///
/// Fields are private: every value has passed `OrderingConfig::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOrderingConfig")]
pub struct OrderingConfig {
    default_gap: i64,
    min_gap: i64,
    rebalance_gap: i64,
    first_position: i64,
}

/// Unchecked wire form; missing fields fall back to defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawOrderingConfig {
    default_gap: i64,
    min_gap: i64,
    rebalance_gap: i64,
    first_position: i64,
}

impl Default for RawOrderingConfig {
    fn default() -> Self {
        Self {
            default_gap: 1000,
            min_gap: 1,
            rebalance_gap: 1000,
            first_position: 1000,
        }
    }
}

impl TryFrom<RawOrderingConfig> for OrderingConfig {
    type Error = ConfigError;

    fn try_from(raw: RawOrderingConfig) -> Result<Self, Self::Error> {
        Self::new(
            raw.default_gap,
            raw.min_gap,
            raw.rebalance_gap,
            raw.first_position,
        )
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        let raw = RawOrderingConfig::default();
        Self {
            default_gap: raw.default_gap,
            min_gap: raw.min_gap,
            rebalance_gap: raw.rebalance_gap,
            first_position: raw.first_position,
        }
    }
}

impl OrderingConfig {
    /// Builds a configuration, rejecting values that would let two keys
    /// collide.
    pub fn new(
        default_gap: i64,
        min_gap: i64,
        rebalance_gap: i64,
        first_position: i64,
    ) -> Result<Self, ConfigError> {
        if min_gap < 1 {
            return Err(invalid("min_gap", min_gap, "must be at least 1"));
        }
        if default_gap < 1 {
            return Err(invalid("default_gap", default_gap, "must be at least 1"));
        }
        if rebalance_gap <= min_gap {
            return Err(invalid(
                "rebalance_gap",
                rebalance_gap,
                "must be greater than min_gap",
            ));
        }
        if first_position <= min_gap {
            return Err(invalid(
                "first_position",
                first_position,
                "must be greater than min_gap",
            ));
        }
        Ok(Self {
            default_gap,
            min_gap,
            rebalance_gap,
            first_position,
        })
    }

    /// Parses a JSON object and validates it. Missing fields keep defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let raw: RawOrderingConfig = serde_json::from_str(input)?;
        Self::try_from(raw)
    }

    /// Step between appended items and between items of a bulk append.
    pub fn default_gap(&self) -> i64 {
        self.default_gap
    }

    /// Gap at or below which two neighbors are considered exhausted.
    pub fn min_gap(&self) -> i64 {
        self.min_gap
    }

    /// Spacing written by a rebalance pass.
    pub fn rebalance_gap(&self) -> i64 {
        self.rebalance_gap
    }

    /// Key of the first item in an empty namespace.
    pub fn first_position(&self) -> i64 {
        self.first_position
    }
}

fn invalid(field: &'static str, value: i64, reason: &'static str) -> ConfigError {
    ConfigError::Invalid {
        field,
        value,
        reason,
    }
}
