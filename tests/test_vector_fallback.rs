mod common;

use ammoscout::application::ingest::ImportBatch;
use ammoscout::application::predicate::ExplicitFilters;
use ammoscout::application::search::SearchOptions;
use ammoscout::domain::entities::retailer::RetailerStatus;
use ammoscout::domain::error::DomainError;
use ammoscout::domain::ports::clock::SystemClock;
use ammoscout::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use ammoscout::domain::ports::intent_parser::IntentParser;
use ammoscout::domain::ports::lens::LensRegistry;
use ammoscout::domain::values::retailer_tier::RetailerTier;
use ammoscout::infrastructure::intent::noop::NoopIntentParser;
use ammoscout::AmmoScout;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

/// Keyword-keyed embeddings: texts mentioning "subsonic" land on one axis,
/// everything else on another, so similarity ranking is deterministic.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("subsonic") {
                    vec![1.0, 0.0, 0.0]
                } else {
                    vec![0.0, 1.0, 0.0]
                }
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Reports a real dimension but embeds nothing at import time, leaving the
/// vector index empty the way a pre-backfill deployment would.
struct UnbackfilledEmbedder;

#[async_trait]
impl EmbeddingProvider for UnbackfilledEmbedder {
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        match input_type {
            InputType::Document => Ok(vec![]),
            InputType::Query => Ok(texts.iter().map(|_| vec![0.0, 1.0, 0.0]).collect()),
        }
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Starts like [`UnbackfilledEmbedder`] and can be switched to real
/// document embeddings, modelling a backfill that comes online later.
struct TogglingEmbedder {
    backfill_enabled: std::sync::atomic::AtomicBool,
}

impl TogglingEmbedder {
    fn new() -> Self {
        Self {
            backfill_enabled: std::sync::atomic::AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for TogglingEmbedder {
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        let backfilling = self.backfill_enabled.load(std::sync::atomic::Ordering::SeqCst);
        match input_type {
            InputType::Document if !backfilling => Ok(vec![]),
            _ => Ok(texts.iter().map(|_| vec![0.0, 1.0, 0.0]).collect()),
        }
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Fails query embedding outright.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        match input_type {
            InputType::Document => Ok(texts.iter().map(|_| vec![0.0, 1.0, 0.0]).collect()),
            InputType::Query => Err(DomainError::Embedding("embedding service down".into())),
        }
    }

    fn dimension(&self) -> usize {
        3
    }
}

fn setup_with_embedder(embedder: Arc<dyn EmbeddingProvider>) -> (AmmoScout, tempfile::TempDir) {
    let intent: Arc<dyn IntentParser> = Arc::new(NoopIntentParser);
    setup_full(embedder, intent, LensRegistry::new(), Arc::new(SystemClock))
}

async fn seed(engine: &AmmoScout) -> (String, String) {
    let mut quiet = product("Whisper Load", "Acme", "9mm Luger", 50);
    quiet.description = Some("subsonic suppressor load".into());
    quiet.is_subsonic = true;
    let loud = product("Range Pack", "Acme", "9mm Luger", 50);
    let ids = (quiet.id.clone(), loud.id.clone());
    engine
        .import(ImportBatch {
            products: vec![quiet, loud],
            retailers: vec![retailer("r-1", "Shop", RetailerTier::Standard, RetailerStatus::Eligible)],
            observations: vec![
                observation("src-quiet", "r-1", 18.0, true, days_ago(1)),
                observation("src-loud", "r-1", 14.0, true, days_ago(1)),
            ],
            resolution_links: vec![link("src-quiet", &ids.0), link("src-loud", &ids.1)],
            ..Default::default()
        })
        .await
        .unwrap();
    ids
}

#[tokio::test]
async fn test_vector_retrieval_ranks_by_similarity() {
    let (engine, _dir) = setup_with_embedder(Arc::new(KeywordEmbedder));
    let (quiet, _) = seed(&engine).await;

    let result = engine
        .search(
            "subsonic for my suppressor",
            SearchOptions {
                use_vector_search: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.search_metadata.strategy, "vector");
    assert!(!result.search_metadata.fell_back);
    assert!(!result.products.is_empty());
    assert_eq!(result.products[0].id, quiet);
}

#[tokio::test]
async fn test_empty_vector_index_falls_back_to_relational() {
    let (engine, _dir) = setup_with_embedder(Arc::new(UnbackfilledEmbedder));
    seed(&engine).await;

    let result = engine
        .search(
            "9mm range ammo",
            SearchOptions {
                use_vector_search: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.search_metadata.strategy, "relational");
    assert!(result.search_metadata.fell_back);
    assert_eq!(result.products.len(), 2);
}

#[tokio::test]
async fn test_embedding_failure_falls_back_to_relational() {
    let (engine, _dir) = setup_with_embedder(Arc::new(FailingEmbedder));
    seed(&engine).await;

    let result = engine
        .search(
            "9mm range ammo",
            SearchOptions {
                use_vector_search: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.search_metadata.strategy, "relational");
    assert!(result.search_metadata.fell_back);
    assert_eq!(result.products.len(), 2);
}

#[tokio::test]
async fn test_explicit_filters_force_relational_path() {
    let (engine, _dir) = setup_with_embedder(Arc::new(KeywordEmbedder));
    seed(&engine).await;

    let result = engine
        .search(
            "subsonic",
            SearchOptions {
                use_vector_search: true,
                filters: ExplicitFilters {
                    brand: Some("Acme".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.search_metadata.strategy, "relational");
    assert!(!result.search_metadata.fell_back);
}

#[tokio::test]
async fn test_noop_embedder_never_attempts_vector_retrieval() {
    let (engine, _dir) = setup();
    seed(&engine).await;

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                use_vector_search: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(result.search_metadata.strategy, "relational");
    assert!(!result.search_metadata.fell_back);
}

#[tokio::test]
async fn test_reindex_backfills_missing_vectors() {
    let embedder = Arc::new(TogglingEmbedder::new());
    let (engine, _dir) = setup_with_embedder(embedder.clone());
    seed(&engine).await;

    embedder
        .backfill_enabled
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let count = engine.reindex().await.unwrap();
    assert_eq!(count, 2);

    let result = engine
        .search(
            "9mm range ammo",
            SearchOptions {
                use_vector_search: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(result.search_metadata.strategy, "vector");
    assert!(!result.search_metadata.fell_back);
}
