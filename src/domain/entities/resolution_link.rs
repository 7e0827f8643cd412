use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Matched,
    Created,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Matched => write!(f, "matched"),
            LinkStatus::Created => write!(f, "created"),
        }
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matched" => Ok(LinkStatus::Matched),
            "created" => Ok(LinkStatus::Created),
            _ => Err(format!("Unknown link status: {s}")),
        }
    }
}

/// Join between one raw source listing and one canonical product.
/// Unique per source item; many-to-one into Product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionLink {
    pub id: String,
    pub source_item_id: String,
    pub product_id: String,
    pub status: LinkStatus,
    pub confidence: f64,
}

impl ResolutionLink {
    pub fn new(source_item_id: String, product_id: String, status: LinkStatus, confidence: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_item_id,
            product_id,
            status,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
