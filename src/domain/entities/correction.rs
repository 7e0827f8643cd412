use crate::domain::entities::observation::SourceObservation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a correction does to the observations it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CorrectionKind {
    /// Exclude the observation entirely.
    Ignore,
    /// Scale the reported price by `factor`.
    Multiplier { factor: f64 },
}

/// Which observations a correction applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum CorrectionScope {
    Product(String),
    Retailer(String),
    Source(String),
    AffiliateChannel(String),
    FeedRun(String),
}

/// Manually-applied, time-boxed override fixing erroneous raw price data.
/// Active over `[starts_at, ends_at)` against the observation timestamp;
/// revocation wins over the interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correction {
    pub id: String,
    pub kind: CorrectionKind,
    pub scope: CorrectionScope,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Correction {
    pub fn new(
        kind: CorrectionKind,
        scope: CorrectionScope,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            scope,
            starts_at,
            ends_at,
            revoked: false,
        }
    }

    /// Whether this correction governs `obs` (scope match + active interval).
    /// The product id the observation resolved to is passed separately since
    /// the observation itself only knows its source item.
    pub fn applies_to(&self, obs: &SourceObservation, product_id: &str) -> bool {
        if self.revoked {
            return false;
        }
        if obs.observed_at < self.starts_at || obs.observed_at >= self.ends_at {
            return false;
        }
        match &self.scope {
            CorrectionScope::Product(id) => id == product_id,
            CorrectionScope::Retailer(id) => id == &obs.retailer_id,
            CorrectionScope::Source(id) => id == &obs.source_item_id,
            CorrectionScope::AffiliateChannel(channel) => {
                obs.run_type == crate::domain::entities::observation::RunType::Affiliate
                    && channel == &obs.run_id
            }
            CorrectionScope::FeedRun(id) => id == &obs.run_id,
        }
    }
}
