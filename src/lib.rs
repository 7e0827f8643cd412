pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::ingest::{ImportBatch, ImportSummary, IngestUseCase};
use crate::application::price_resolver::PriceResolver;
use crate::application::price_signal::SignalCalculator;
use crate::application::price_stats::{CaliberPriceStats, CaliberStatsCache};
use crate::application::reindex::ReindexUseCase;
use crate::application::search::{SearchConfig, SearchOptions, SearchUseCase};
use crate::application::response::SearchResult;
use crate::domain::entities::visible_price::VisiblePrice;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::{Clock, SystemClock};
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::intent_parser::IntentParser;
use crate::domain::ports::lens::LensRegistry;
use crate::domain::ports::price_repository::PriceRepository;
use crate::domain::ports::product_repository::ProductRepository;
use crate::domain::ports::vector_index::VectorIndex;
use crate::infrastructure::embeddings::noop::NoopProvider;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use crate::infrastructure::intent::noop::NoopIntentParser;
use crate::infrastructure::intent::remote::RemoteIntentParser;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::price_repo::SqlitePriceRepo;
use crate::infrastructure::sqlite::product_repo::SqliteProductRepo;
use crate::infrastructure::sqlite::vector_index::SqliteVectorIndex;
use rusqlite::Connection;
use std::sync::Arc;

pub struct AmmoScout {
    search_uc: SearchUseCase,
    ingest_uc: IngestUseCase,
    reindex_uc: ReindexUseCase,
    price_resolver: Arc<PriceResolver>,
    stats_cache: Arc<CaliberStatsCache>,
    config: SearchConfig,
}

impl AmmoScout {
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let provider = std::env::var("AMMOSCOUT_EMBEDDING_PROVIDER").unwrap_or_else(|_| "noop".into());
        let api_key = std::env::var("AMMOSCOUT_EMBEDDING_API_KEY").unwrap_or_default();
        let model = std::env::var("AMMOSCOUT_EMBEDDING_MODEL").ok();

        let embedder: Arc<dyn EmbeddingProvider> = match provider.as_str() {
            "openai" => Arc::new(OpenAiProvider::new(api_key, model)),
            _ => Arc::new(NoopProvider),
        };

        let intent_parser: Arc<dyn IntentParser> = match std::env::var("AMMOSCOUT_INTENT_URL") {
            Ok(url) => Arc::new(RemoteIntentParser::new(
                url,
                std::env::var("AMMOSCOUT_INTENT_API_KEY").ok(),
            )),
            Err(_) => Arc::new(NoopIntentParser),
        };

        Self::with_providers(
            db_path,
            embedder,
            intent_parser,
            LensRegistry::new(),
            SearchConfig::from_env(),
            Arc::new(SystemClock),
        )
    }

    pub fn with_providers(
        db_path: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        intent_parser: Arc<dyn IntentParser>,
        lenses: LensRegistry,
        config: SearchConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let conn1 = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn1.pragma_update(None, "journal_mode", "WAL").map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        let conn2 = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn2.pragma_update(None, "journal_mode", "WAL").map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        let conn3 = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn3.pragma_update(None, "journal_mode", "WAL").map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;

        run_migrations(&conn1)?;

        let product_repo: Arc<dyn ProductRepository> = Arc::new(SqliteProductRepo::new(conn1));
        let price_repo: Arc<dyn PriceRepository> = Arc::new(SqlitePriceRepo::new(conn2));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(SqliteVectorIndex::new(conn3));

        let provider_dim = embedder.dimension();
        if provider_dim > 0 {
            if let Ok(Some(stored_dim)) = vector_index.stored_dimension() {
                if stored_dim != provider_dim {
                    tracing::warn!(
                        stored = stored_dim,
                        provider = provider_dim,
                        "stored vector dimension differs from embedding provider, run `reindex`"
                    );
                }
            }
        }

        let price_resolver = Arc::new(PriceResolver::new(price_repo.clone(), clock.clone()));
        let stats_cache = Arc::new(CaliberStatsCache::new(price_repo.clone(), clock));
        let signal_calculator = SignalCalculator::new(stats_cache.clone());

        Ok(Self {
            search_uc: SearchUseCase::new(
                product_repo.clone(),
                embedder.clone(),
                vector_index.clone(),
                intent_parser,
                price_resolver.clone(),
                signal_calculator,
                lenses,
                config.clone(),
            ),
            ingest_uc: IngestUseCase::new(product_repo.clone(), price_repo, embedder.clone(), vector_index.clone()),
            reindex_uc: ReindexUseCase::new(product_repo, embedder, vector_index),
            price_resolver,
            stats_cache,
            config,
        })
    }

    // Delegating methods
    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult, DomainError> {
        self.search_uc.search(query, options).await
    }

    pub async fn import(&self, batch: ImportBatch) -> Result<ImportSummary, DomainError> {
        self.ingest_uc.import(batch).await
    }

    pub fn revoke_correction(&self, id: &str) -> Result<(), DomainError> {
        self.ingest_uc.revoke_correction(id)
    }

    pub fn caliber_stats(&self, caliber: &str) -> Result<CaliberPriceStats, DomainError> {
        self.stats_cache.get_stats(caliber)
    }

    pub fn product_prices(&self, product_id: &str) -> Result<Vec<VisiblePrice>, DomainError> {
        self.price_resolver.resolve(product_id, self.config.lookback_days)
    }

    pub fn warm_cache(&self, calibers: &[String]) {
        self.stats_cache.warm(calibers)
    }

    /// Drop the cached statistics snapshot for a caliber so the next read
    /// recomputes, regardless of remaining TTL.
    pub fn invalidate_stats(&self, caliber: &str) {
        self.stats_cache.invalidate(caliber)
    }

    pub async fn reindex(&self) -> Result<usize, DomainError> {
        self.reindex_uc.execute().await
    }
}
