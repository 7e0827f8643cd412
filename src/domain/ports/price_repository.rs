use crate::domain::entities::correction::Correction;
use crate::domain::entities::observation::SourceObservation;
use crate::domain::entities::resolution_link::ResolutionLink;
use crate::domain::entities::retailer::{MerchantLink, Retailer, SourceAdapterStatus};
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;

/// One joined row from the price store: an observation together with
/// everything needed to judge visibility and corrections without further
/// round trips.
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub observation: SourceObservation,
    pub product_id: String,
    pub round_count: Option<u32>,
    pub link_confidence: f64,
    pub retailer: Retailer,
    pub merchant_link: Option<MerchantLink>,
    pub adapter: Option<SourceAdapterStatus>,
}

pub trait PriceRepository: Send + Sync {
    /// All joined rows for the given products observed at or after `since`.
    /// One batch round trip; unknown product ids simply contribute no rows.
    fn price_rows(&self, product_ids: &[String], since: DateTime<Utc>) -> Result<Vec<PriceRow>, DomainError>;

    /// All joined rows for products whose normalized caliber contains the
    /// normalized label, observed at or after `since`. Feeds the statistics
    /// window.
    fn rows_for_caliber(&self, caliber_label: &str, since: DateTime<Utc>) -> Result<Vec<PriceRow>, DomainError>;

    /// Corrections whose active interval overlaps `[since, until)`,
    /// revoked ones included so the index can drop them explicitly.
    fn corrections_overlapping(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Correction>, DomainError>;

    // Ingest boundary, used by the CLI import command and tests. The
    // resolution pipeline that normally writes these lives outside this core.
    fn add_retailer(&self, retailer: &Retailer) -> Result<(), DomainError>;
    fn add_merchant_link(&self, link: &MerchantLink) -> Result<(), DomainError>;
    fn add_adapter(&self, adapter: &SourceAdapterStatus) -> Result<(), DomainError>;
    fn add_observation(&self, obs: &SourceObservation) -> Result<(), DomainError>;
    fn add_resolution_link(&self, link: &ResolutionLink) -> Result<(), DomainError>;
    fn add_correction(&self, correction: &Correction) -> Result<(), DomainError>;
    fn revoke_correction(&self, id: &str) -> Result<(), DomainError>;
}
