use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller tier controls response shaping: standard callers receive only the
/// qualitative price band, elevated callers the full numeric breakdown and
/// the tier-gated filter fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerTier {
    Standard,
    Elevated,
}

impl Default for CallerTier {
    fn default() -> Self {
        CallerTier::Standard
    }
}

impl fmt::Display for CallerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerTier::Standard => write!(f, "standard"),
            CallerTier::Elevated => write!(f, "elevated"),
        }
    }
}

impl FromStr for CallerTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(CallerTier::Standard),
            "elevated" | "premium" => Ok(CallerTier::Elevated),
            _ => Err(format!("Unknown caller tier: {s}")),
        }
    }
}
