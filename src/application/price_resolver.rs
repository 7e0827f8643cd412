//! Price aggregation resolver.
//!
//! Turns raw joined price rows into the canonical per-product visible price
//! list every downstream component consumes: visibility filter, correction
//! resolution, one price per retailer, ascending corrected price.

use crate::application::corrections::{CorrectionIndex, CorrectionOutcome};
use crate::application::visibility::is_visible;
use crate::domain::entities::visible_price::VisiblePrice;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::price_repository::{PriceRepository, PriceRow};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;

/// Batch output: both maps come from a single resolution pass so callers
/// never re-resolve to learn confidence.
#[derive(Debug, Default)]
pub struct PriceResolution {
    pub price_map: HashMap<String, Vec<VisiblePrice>>,
    pub confidence_map: HashMap<String, f64>,
}

pub struct PriceResolver {
    price_repo: Arc<dyn PriceRepository>,
    clock: Arc<dyn Clock>,
}

impl PriceResolver {
    pub fn new(price_repo: Arc<dyn PriceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { price_repo, clock }
    }

    /// Resolve all currently-visible prices for one product.
    pub fn resolve(&self, product_id: &str, lookback_days: i64) -> Result<Vec<VisiblePrice>, DomainError> {
        let mut resolution = self.resolve_batch(&[product_id.to_string()], lookback_days)?;
        Ok(resolution.price_map.remove(product_id).unwrap_or_default())
    }

    /// Batch variant: one round trip for observations and one for the
    /// corrections overlapping the window. Unknown ids yield empty lists.
    pub fn resolve_batch(&self, product_ids: &[String], lookback_days: i64) -> Result<PriceResolution, DomainError> {
        let now = self.clock.now();
        let since = now - Duration::days(lookback_days);

        let mut resolution = PriceResolution::default();
        for id in product_ids {
            resolution.price_map.entry(id.clone()).or_default();
        }
        if product_ids.is_empty() {
            return Ok(resolution);
        }

        let rows = self.price_repo.price_rows(product_ids, since)?;
        let corrections = self.price_repo.corrections_overlapping(since, now)?;
        let index = CorrectionIndex::new(corrections);

        // product id -> retailer id -> best surviving row for that retailer
        let mut per_retailer: HashMap<String, HashMap<String, VisiblePrice>> = HashMap::new();

        for row in rows {
            let Some(price) = self.corrected_visible_price(&row, &index) else {
                continue;
            };

            let conf = resolution.confidence_map.entry(row.product_id.clone()).or_insert(0.0);
            if row.link_confidence > *conf {
                *conf = row.link_confidence;
            }

            let by_retailer = per_retailer.entry(row.product_id.clone()).or_default();
            match by_retailer.get(&price.retailer_id) {
                Some(kept) if !newer_or_cheaper(&price, kept) => {}
                _ => {
                    by_retailer.insert(price.retailer_id.clone(), price);
                }
            }
        }

        for (product_id, by_retailer) in per_retailer {
            let mut prices: Vec<VisiblePrice> = by_retailer.into_values().collect();
            prices.sort_by(|a, b| {
                a.price
                    .partial_cmp(&b.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.retailer_tier.sort_rank().cmp(&b.retailer_tier.sort_rank()))
            });
            resolution.price_map.insert(product_id, prices);
        }

        Ok(resolution)
    }

    fn corrected_visible_price(&self, row: &PriceRow, index: &CorrectionIndex) -> Option<VisiblePrice> {
        if !is_visible(
            &row.observation,
            &row.retailer,
            row.merchant_link.as_ref(),
            row.adapter.as_ref(),
        ) {
            return None;
        }

        let price = match index.resolve(&row.observation, &row.product_id) {
            CorrectionOutcome::Unchanged => row.observation.price,
            CorrectionOutcome::Adjusted(p) => p,
            CorrectionOutcome::Excluded => return None,
        };

        let price_per_round = row
            .round_count
            .filter(|&n| n > 0)
            .map(|n| price / n as f64);

        Some(VisiblePrice {
            retailer_id: row.retailer.id.clone(),
            retailer_name: row.retailer.name.clone(),
            retailer_tier: row.retailer.tier,
            price,
            price_per_round,
            in_stock: row.observation.in_stock,
            observed_at: row.observation.observed_at,
            url: row.observation.url.clone(),
            link_confidence: row.link_confidence,
        })
    }
}

/// Dedup rule: most recent observation wins; on an exact timestamp tie the
/// lower price does.
fn newer_or_cheaper(candidate: &VisiblePrice, kept: &VisiblePrice) -> bool {
    match candidate.observed_at.cmp(&kept.observed_at) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => candidate.price < kept.price,
        std::cmp::Ordering::Less => false,
    }
}
