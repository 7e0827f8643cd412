use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::product_repository::ProductRepository;
use crate::domain::ports::vector_index::VectorIndex;
use std::sync::Arc;

/// Embedding backfill: embeds every product missing a vector. Vector
/// retrieval may return nothing for a caliber mid-backfill, which is exactly
/// the gap the orchestrator's relational fallback covers.
pub struct ReindexUseCase {
    products: Arc<dyn ProductRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
}

impl ReindexUseCase {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self { products, embedder, vector_index }
    }

    pub async fn execute(&self) -> Result<usize, DomainError> {
        let pending = self.products.products_missing_vectors()?;
        let total = pending.len();
        if total == 0 {
            return Ok(0);
        }

        // Batch embed in chunks of 32
        for chunk in pending.chunks(32) {
            let texts: Vec<String> = chunk.iter().map(|p| p.searchable_text()).collect();
            let vectors = self.embedder.embed(&texts, InputType::Document).await?;
            for (product, vector) in chunk.iter().zip(vectors.iter()) {
                self.vector_index.store(&product.id, vector)?;
            }
        }

        Ok(total)
    }
}
