//! Catalog/price-feed write boundary.
//!
//! The real resolution pipeline lives outside this core; this use case is
//! the minimal ingest surface it (and the CLI import command, and the test
//! suite) writes through. Products are embedded on insert when an embedding
//! provider is configured, mirroring the reindex path.

use crate::domain::entities::correction::Correction;
use crate::domain::entities::observation::SourceObservation;
use crate::domain::entities::product::Product;
use crate::domain::entities::resolution_link::ResolutionLink;
use crate::domain::entities::retailer::{MerchantLink, Retailer, SourceAdapterStatus};
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::price_repository::PriceRepository;
use crate::domain::ports::product_repository::ProductRepository;
use crate::domain::ports::vector_index::VectorIndex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One import payload, JSON-shaped for the CLI.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportBatch {
    pub products: Vec<Product>,
    pub retailers: Vec<Retailer>,
    pub merchant_links: Vec<MerchantLink>,
    pub adapters: Vec<SourceAdapterStatus>,
    pub observations: Vec<SourceObservation>,
    pub resolution_links: Vec<ResolutionLink>,
    pub corrections: Vec<Correction>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub products: usize,
    pub retailers: usize,
    pub observations: usize,
    pub links: usize,
    pub corrections: usize,
}

pub struct IngestUseCase {
    products: Arc<dyn ProductRepository>,
    prices: Arc<dyn PriceRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
}

impl IngestUseCase {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        prices: Arc<dyn PriceRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self { products, prices, embedder, vector_index }
    }

    pub async fn import(&self, batch: ImportBatch) -> Result<ImportSummary, DomainError> {
        let mut summary = ImportSummary::default();

        for retailer in &batch.retailers {
            self.prices.add_retailer(retailer)?;
            summary.retailers += 1;
        }
        for link in &batch.merchant_links {
            self.prices.add_merchant_link(link)?;
        }
        for adapter in &batch.adapters {
            self.prices.add_adapter(adapter)?;
        }
        for product in &batch.products {
            self.products.add(product)?;
            summary.products += 1;
        }
        for obs in &batch.observations {
            self.prices.add_observation(obs)?;
            summary.observations += 1;
        }
        for link in &batch.resolution_links {
            self.prices.add_resolution_link(link)?;
            summary.links += 1;
        }
        for correction in &batch.corrections {
            self.prices.add_correction(correction)?;
            summary.corrections += 1;
        }

        // Embed new products; an embedding failure never fails the import.
        if self.embedder.dimension() > 0 && !batch.products.is_empty() {
            let texts: Vec<String> = batch.products.iter().map(|p| p.searchable_text()).collect();
            match self.embedder.embed(&texts, InputType::Document).await {
                Ok(vectors) => {
                    for (product, vector) in batch.products.iter().zip(vectors.iter()) {
                        if let Err(e) = self.vector_index.store(&product.id, vector) {
                            tracing::warn!(product_id = %product.id, error = %e, "vector store failed");
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "embedding skipped for imported products"),
            }
        }

        Ok(summary)
    }

    pub fn revoke_correction(&self, id: &str) -> Result<(), DomainError> {
        self.prices.revoke_correction(id)
    }
}
