//! Personalization ("lens") pipeline port.
//!
//! A lens is an optional external post-retrieval step that re-orders or
//! filters the candidate set. This core hands it candidates with resolved
//! prices and link confidence, and treats its ordering as authoritative
//! unless the caller explicitly asked for a non-default sort.

use crate::domain::entities::product::Product;
use crate::domain::entities::visible_price::VisiblePrice;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Visible prices are resolved before the lens runs; the candidate carries
/// them so a lens never re-queries the price store.
#[derive(Debug, Clone)]
pub struct LensCandidate {
    pub product: Product,
    pub cheapest_price: Option<f64>,
    pub in_stock: bool,
    pub resolution_confidence: f64,
}

/// Lens result: the ordered subset plus metadata surfaced to the caller.
/// `zero_eligible` distinguishes "the lens rejected everything" from
/// "nothing matched the query".
#[derive(Debug, Clone, Serialize)]
pub struct LensOutcome {
    pub ordered_ids: Vec<String>,
    pub auto_applied: bool,
    pub reason_code: String,
    pub zero_eligible: bool,
}

#[async_trait]
pub trait LensPipeline: Send + Sync {
    fn id(&self) -> &str;
    async fn apply(&self, candidates: &[LensCandidate]) -> Result<LensOutcome, DomainError>;
}

/// Registry of known lens pipelines. An unknown id is a distinct,
/// non-retried error for the request that named it.
#[derive(Default, Clone)]
pub struct LensRegistry {
    pipelines: HashMap<String, Arc<dyn LensPipeline>>,
}

impl LensRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pipeline: Arc<dyn LensPipeline>) {
        self.pipelines.insert(pipeline.id().to_string(), pipeline);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn LensPipeline>, DomainError> {
        self.pipelines
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::UnknownPipeline(id.to_string()))
    }
}

/// Cheapest-price summary used to build candidates without re-walking the
/// resolved list.
pub fn candidate_from_prices(product: Product, prices: &[VisiblePrice], confidence: f64) -> LensCandidate {
    let cheapest = prices
        .iter()
        .map(|p| p.price)
        .fold(None::<f64>, |acc, p| Some(acc.map_or(p, |a| a.min(p))));
    let in_stock = prices.iter().any(|p| p.in_stock);
    LensCandidate {
        product,
        cheapest_price: cheapest,
        in_stock,
        resolution_confidence: confidence,
    }
}
