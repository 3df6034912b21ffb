//! Engine tuning options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How [`Engine::allocate_cidr`](super::Engine::allocate_cidr) picks a block.
///
/// # Examples
///
/// ```
/// use cidrguard::SearchStrategy;
///
/// assert_eq!(SearchStrategy::default(), SearchStrategy::FirstAligned);
/// assert_eq!("first-fit".parse::<SearchStrategy>().unwrap(), SearchStrategy::FirstFit);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// Take the lowest aligned available address and fail if its block has a gap.
    #[default]
    FirstAligned,
    /// Take the lowest aligned address whose whole block is available.
    FirstFit,
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstAligned => write!(f, "first-aligned"),
            Self::FirstFit => write!(f, "first-fit"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first-aligned" => Ok(Self::FirstAligned),
            "first-fit" => Ok(Self::FirstFit),
            _ => Err(Error::Validation {
                field: "allocation.search".into(),
                message: format!("unknown search strategy '{s}' (expected first-aligned or first-fit)"),
            }),
        }
    }
}

/// Options applied to every engine operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Block search strategy.
    pub search: SearchStrategy,
}

impl EngineOptions {
    /// Sets the block search strategy.
    #[must_use]
    pub const fn with_search(mut self, search: SearchStrategy) -> Self {
        self.search = search;
        self
    }
}
