use crate::domain::values::retailer_tier::RetailerTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A consumer-visible price: the result of applying the visibility filter
/// and all active corrections to a source observation at read time. Derived,
/// never persisted as ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisiblePrice {
    pub retailer_id: String,
    pub retailer_name: String,
    pub retailer_tier: RetailerTier,
    /// Corrected price; the raw observation amount is not surfaced.
    pub price: f64,
    pub price_per_round: Option<f64>,
    pub in_stock: bool,
    pub observed_at: DateTime<Utc>,
    pub url: String,
    /// Max resolution-link confidence backing this row. Internal; stripped
    /// by the response projection.
    #[serde(skip_serializing)]
    pub link_confidence: f64,
}
