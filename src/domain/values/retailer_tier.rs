use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetailerTier {
    Standard,
    Premium,
}

impl RetailerTier {
    /// Premium listings win equal-price ties in the per-product price list.
    pub fn sort_rank(&self) -> u8 {
        match self {
            RetailerTier::Premium => 0,
            RetailerTier::Standard => 1,
        }
    }
}

impl fmt::Display for RetailerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetailerTier::Standard => write!(f, "standard"),
            RetailerTier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for RetailerTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(RetailerTier::Standard),
            "premium" => Ok(RetailerTier::Premium),
            _ => Err(format!("Unknown retailer tier: {s}")),
        }
    }
}
