use crate::domain::values::retailer_tier::RetailerTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetailerStatus {
    Eligible,
    Paused,
    Delisted,
}

impl fmt::Display for RetailerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetailerStatus::Eligible => write!(f, "eligible"),
            RetailerStatus::Paused => write!(f, "paused"),
            RetailerStatus::Delisted => write!(f, "delisted"),
        }
    }
}

impl FromStr for RetailerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eligible" => Ok(RetailerStatus::Eligible),
            "paused" => Ok(RetailerStatus::Paused),
            "delisted" => Ok(RetailerStatus::Delisted),
            _ => Err(format!("Unknown retailer status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retailer {
    pub id: String,
    pub name: String,
    pub tier: RetailerTier,
    pub status: RetailerStatus,
}

impl Retailer {
    pub fn new(name: String, tier: RetailerTier, status: RetailerStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            tier,
            status,
        }
    }
}

/// Merchant subscription state for a retailer. Absent for retailers with no
/// merchant relationship, which is not itself a visibility problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantLink {
    pub retailer_id: String,
    pub listed: bool,
    pub active: bool,
}

/// Guardrail state for automated-collection sources. Scrape-run observations
/// are invisible unless an adapter row exists, both compliance flags are set
/// and the adapter is currently enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAdapterStatus {
    pub retailer_id: String,
    pub robots_compliant: bool,
    pub tos_compliant: bool,
    pub enabled: bool,
}
