use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an ingestion run collected its rows. Scrape runs are subject to
/// adapter/compliance guardrails before any of their prices may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Affiliate,
    Scrape,
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunType::Affiliate => write!(f, "affiliate"),
            RunType::Scrape => write!(f, "scrape"),
        }
    }
}

impl FromStr for RunType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "affiliate" | "feed" => Ok(RunType::Affiliate),
            "scrape" | "scraper" => Ok(RunType::Scrape),
            _ => Err(format!("Unknown run type: {s}")),
        }
    }
}

/// One retailer-reported price snapshot. Many exist per product over time
/// and across retailers; visibility and corrections are applied at read
/// time, never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceObservation {
    pub id: String,
    pub source_item_id: String,
    pub retailer_id: String,
    pub price: f64,
    pub currency: String,
    pub in_stock: bool,
    pub observed_at: DateTime<Utc>,
    pub run_type: RunType,
    pub run_id: String,
    pub shipping_cost: Option<f64>,
    pub url: String,
}

impl SourceObservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_item_id: String,
        retailer_id: String,
        price: f64,
        in_stock: bool,
        observed_at: DateTime<Utc>,
        run_type: RunType,
        run_id: String,
        url: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_item_id,
            retailer_id,
            price,
            currency: "USD".to_string(),
            in_stock,
            observed_at,
            run_type,
            run_id,
            shipping_cost: None,
            url,
        }
    }
}
