//! Query planner / search orchestrator.
//!
//! Merges parsed intent with explicit filters, picks a retrieval strategy
//! with sequential fallback, attaches prices, applies the lens pipeline when
//! requested, ranks, paginates and shapes the response per caller tier.

use crate::application::predicate::{merge, ExplicitFilters, MergedQuery};
use crate::application::price_resolver::PriceResolver;
use crate::application::price_signal::SignalCalculator;
use crate::application::ranking;
use crate::application::response::{
    build_facets, contains_forbidden_field, project_product, Pagination, PipelineInfo, RankedProduct,
    SearchMetadata, SearchResult,
};
use crate::domain::entities::product::Product;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::intent_parser::{IntentParser, ParsedIntent};
use crate::domain::ports::lens::{candidate_from_prices, LensRegistry};
use crate::domain::ports::product_repository::{ProductRepository, SearchPredicate};
use crate::domain::ports::vector_index::VectorIndex;
use crate::domain::values::caller_tier::CallerTier;
use crate::domain::values::sort_order::SortBy;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_PAGE_LIMIT: usize = 20;
const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Trailing observation window for price resolution.
    pub lookback_days: i64,
    /// Cap on candidates fetched before scoring/pagination.
    pub max_candidates: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            max_candidates: 500,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(days) = std::env::var("AMMOSCOUT_LOOKBACK_DAYS") {
            if let Ok(days) = days.parse() {
                config.lookback_days = days;
            }
        }
        config
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub page: usize,
    pub limit: usize,
    pub sort_by: SortBy,
    pub use_vector_search: bool,
    pub filters: ExplicitFilters,
    pub pipeline_id: Option<String>,
    pub tier: CallerTier,
}

/// Retrieval fallback state machine. States are enumerated rather than
/// hidden in nested error handling so each transition is testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetrievalState {
    Init,
    TryVector,
    TryRelational,
    Done,
}

struct Retrieved {
    products: Vec<Product>,
    /// Retrieval-stage score per product id, normalized 0..1.
    scores: HashMap<String, f64>,
    strategy: &'static str,
    fell_back: bool,
}

pub struct SearchUseCase {
    products: Arc<dyn ProductRepository>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    intent_parser: Arc<dyn IntentParser>,
    price_resolver: Arc<PriceResolver>,
    signal_calculator: SignalCalculator,
    lenses: LensRegistry,
    config: SearchConfig,
}

impl SearchUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        products: Arc<dyn ProductRepository>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        intent_parser: Arc<dyn IntentParser>,
        price_resolver: Arc<PriceResolver>,
        signal_calculator: SignalCalculator,
        lenses: LensRegistry,
        config: SearchConfig,
    ) -> Self {
        Self {
            products,
            embedder,
            vector_index,
            intent_parser,
            price_resolver,
            signal_calculator,
            lenses,
            config,
        }
    }

    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<SearchResult, DomainError> {
        let page = options.page.max(1);
        let limit = if options.limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            options.limit.min(MAX_PAGE_LIMIT)
        };

        // 1-2. Parse intent (degrading to empty on failure) and merge.
        let intent = match self.intent_parser.parse(query).await {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "intent parsing failed, proceeding without intent");
                ParsedIntent::default()
            }
        };
        let intent_confidence = intent.confidence;
        let merged = merge(intent, options.filters.clone(), options.tier);
        let predicate = merged.compose();

        // 3. Retrieval with sequential fallback.
        let retrieved = self.retrieve(query, &predicate, &merged, options.use_vector_search).await?;
        let facets = build_facets(&retrieved.products);

        // 4. Attach prices in one batch and post-filter by price/stock.
        let ids: Vec<String> = retrieved.products.iter().map(|p| p.id.clone()).collect();
        let mut resolution = self.price_resolver.resolve_batch(&ids, self.config.lookback_days)?;

        let lens_active = options.pipeline_id.is_some();
        // Only an explicit price/stock condition disables completeness
        // retention; an intent-guessed bound must not hide unpriced rows
        // from the lens.
        let keep_unpriced = lens_active && !merged.has_explicit_price_conditions();

        let mut items: Vec<RankedProduct> = Vec::new();
        for product in retrieved.products {
            let mut prices = resolution.price_map.remove(&product.id).unwrap_or_default();
            prices.retain(|p| {
                (!merged.price.in_stock_only || p.in_stock)
                    && merged.price.min_price.map_or(true, |min| p.price >= min)
                    && merged.price.max_price.map_or(true, |max| p.price <= max)
            });
            // 5. Zero-price products drop out unless the lens contract
            // requires completeness.
            if prices.is_empty() && !keep_unpriced {
                continue;
            }
            let confidence = resolution.confidence_map.get(&product.id).copied().unwrap_or(0.0);
            let retrieval_score = retrieved.scores.get(&product.id).copied();
            items.push(RankedProduct {
                product,
                prices,
                signal: None,
                ranking: None,
                retrieval_score,
                resolution_confidence: confidence,
            });
        }

        // 6. Lens delegation; its ordering is authoritative unless the
        // caller explicitly asked for a non-default sort.
        let mut pipeline_info = None;
        let mut lens_ordered = false;
        if let Some(pipeline_id) = &options.pipeline_id {
            let lens = self.lenses.get(pipeline_id)?;
            let candidates: Vec<_> = items
                .iter()
                .map(|i| candidate_from_prices(i.product.clone(), &i.prices, i.resolution_confidence))
                .collect();
            let outcome = lens.apply(&candidates).await?;
            pipeline_info = Some(PipelineInfo::from_outcome(pipeline_id, &outcome));

            let rank: HashMap<&str, usize> = outcome
                .ordered_ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            items.retain(|i| rank.contains_key(i.product.id.as_str()));
            items.sort_by_key(|i| rank[i.product.id.as_str()]);
            lens_ordered = options.sort_by.is_default();
        }

        // 7-8. Rank/sort, trim, and ensure every returned row carries a
        // price signal.
        if lens_ordered {
            // Lens order stands; unpriced completeness rows sink to the end.
            items.sort_by_key(|i| i.cheapest_price().is_none());
        } else {
            match options.sort_by {
                SortBy::Relevance | SortBy::PriceContext => {
                    self.attach_signals(&mut items).await?;
                    for item in items.iter_mut() {
                        let signals = merged.intent_signals(item.retrieval_score);
                        item.ranking = Some(ranking::score(&item.product, &signals, item.signal.as_ref()));
                    }
                    sort_ranked(&mut items, options.sort_by);
                }
                SortBy::PriceAsc | SortBy::PriceDesc | SortBy::DateAsc | SortBy::DateDesc => {
                    sort_ranked(&mut items, options.sort_by);
                }
            }
        }

        let total = items.len();
        let start = (page - 1) * limit;
        let mut page_items: Vec<RankedProduct> = if start >= items.len() {
            Vec::new()
        } else {
            items.drain(start..(start + limit).min(total)).collect()
        };

        self.attach_signals(&mut page_items).await?;
        for item in page_items.iter_mut() {
            if item.ranking.is_none() {
                let signals = merged.intent_signals(item.retrieval_score);
                item.ranking = Some(ranking::score(&item.product, &signals, item.signal.as_ref()));
            }
        }

        // 9. Tier-shaped projection.
        let products = page_items.iter().map(|i| project_product(i, options.tier)).collect();

        let result = SearchResult {
            products,
            facets,
            pagination: Pagination::new(page, limit, total),
            search_metadata: SearchMetadata {
                query: query.to_string(),
                strategy: retrieved.strategy.to_string(),
                fell_back: retrieved.fell_back,
                sort_by: options.sort_by,
                intent_confidence,
                tier: options.tier,
            },
            pipeline: pipeline_info,
        };

        if cfg!(debug_assertions) {
            if let Ok(serialized) = serde_json::to_value(&result) {
                debug_assert_eq!(contains_forbidden_field(&serialized), None);
            }
        }

        Ok(result)
    }

    /// Run the retrieval state machine: vector only when enabled and no
    /// explicit filters are present; fall back to the relational path on
    /// runtime error or on an empty vector result while the relational
    /// predicate still has candidates (embedding backfill gaps). Strategies
    /// run sequentially, never racing.
    async fn retrieve(
        &self,
        query: &str,
        predicate: &SearchPredicate,
        merged: &MergedQuery,
        use_vector: bool,
    ) -> Result<Retrieved, DomainError> {
        let mut state = RetrievalState::Init;
        let mut fell_back = false;
        let mut vector_hit: Option<Retrieved> = None;

        while state != RetrievalState::Done {
            state = match state {
                RetrievalState::Init => {
                    if use_vector && !merged.has_explicit_filters && self.embedder.dimension() > 0 {
                        RetrievalState::TryVector
                    } else {
                        RetrievalState::TryRelational
                    }
                }
                RetrievalState::TryVector => match self.vector_retrieve(query, predicate).await {
                    Ok(hit) if !hit.products.is_empty() => {
                        vector_hit = Some(hit);
                        RetrievalState::Done
                    }
                    Ok(_) => {
                        if self.products.count(predicate)? > 0 {
                            tracing::debug!("vector retrieval empty with relational candidates, falling back");
                            fell_back = true;
                            RetrievalState::TryRelational
                        } else {
                            vector_hit = Some(Retrieved {
                                products: Vec::new(),
                                scores: HashMap::new(),
                                strategy: "vector",
                                fell_back: false,
                            });
                            RetrievalState::Done
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "vector retrieval failed, falling back to relational");
                        fell_back = true;
                        RetrievalState::TryRelational
                    }
                },
                RetrievalState::TryRelational => {
                    let products = self.products.find(predicate, self.config.max_candidates)?;
                    let scores = heuristic_scores(query, &products);
                    vector_hit = Some(Retrieved {
                        products,
                        scores,
                        strategy: "relational",
                        fell_back,
                    });
                    RetrievalState::Done
                }
                RetrievalState::Done => RetrievalState::Done,
            };
        }

        Ok(vector_hit.unwrap_or(Retrieved {
            products: Vec::new(),
            scores: HashMap::new(),
            strategy: "relational",
            fell_back,
        }))
    }

    async fn vector_retrieve(&self, query: &str, predicate: &SearchPredicate) -> Result<Retrieved, DomainError> {
        let vectors = self.embedder.embed(&[query.to_string()], InputType::Query).await?;
        let Some(vector) = vectors.first() else {
            return Err(DomainError::Embedding("no query embedding returned".into()));
        };
        let hits = self.vector_index.search_similar(vector, self.config.max_candidates)?;

        let ids: Vec<String> = hits.iter().map(|(id, _)| id.clone()).collect();
        let by_id: HashMap<String, Product> = self
            .products
            .get_by_ids(&ids)?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        // The hard predicate (caliber) still applies to vector hits.
        let mut products = Vec::new();
        let mut scores = HashMap::new();
        for (id, similarity) in hits {
            if let Some(product) = by_id.get(&id) {
                if predicate.matches(product) {
                    scores.insert(id.clone(), similarity.clamp(0.0, 1.0));
                    products.push(product.clone());
                }
            }
        }

        Ok(Retrieved {
            products,
            scores,
            strategy: "vector",
            fell_back: false,
        })
    }

    async fn attach_signals(&self, items: &mut [RankedProduct]) -> Result<(), DomainError> {
        let pending: Vec<_> = items
            .iter()
            .filter(|i| i.signal.is_none())
            .map(|i| (i.product.clone(), i.prices.clone()))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        let signals = self.signal_calculator.calculate_batch(pending).await?;
        for item in items.iter_mut() {
            if item.signal.is_none() {
                item.signal = signals.get(&item.product.id).cloned();
            }
        }
        Ok(())
    }
}

/// Heuristic relevance for the relational path: the fraction of query terms
/// found in the product's searchable text.
fn heuristic_scores(query: &str, products: &[Product]) -> HashMap<String, f64> {
    let terms: Vec<String> = query.to_lowercase().split_whitespace().map(String::from).collect();
    let mut scores = HashMap::new();
    if terms.is_empty() {
        return scores;
    }
    for product in products {
        let text = product.searchable_text().to_lowercase();
        let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
        scores.insert(product.id.clone(), matched as f64 / terms.len() as f64);
    }
    scores
}

/// Comparator sorts. Stable, so ties preserve retrieval order; rows missing
/// the sort key always sink to the end.
fn sort_ranked(items: &mut [RankedProduct], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => {
            items.sort_by(|a, b| {
                let sa = a.ranking.as_ref().map(|r| r.final_score).unwrap_or(0.0);
                let sb = b.ranking.as_ref().map(|r| r.final_score).unwrap_or(0.0);
                sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        SortBy::PriceContext => {
            items.sort_by(|a, b| {
                let pos = |i: &RankedProduct| {
                    i.signal
                        .as_ref()
                        .filter(|s| s.context_band != crate::domain::values::context_band::ContextBand::InsufficientData)
                        .map(|s| s.position_in_range)
                        .unwrap_or(f64::MAX)
                };
                pos(a).partial_cmp(&pos(b)).unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        SortBy::PriceAsc | SortBy::PriceDesc => {
            items.sort_by(|a, b| {
                let pa = a.cheapest_price_per_round().unwrap_or(f64::MAX);
                let pb = b.cheapest_price_per_round().unwrap_or(f64::MAX);
                let ord = pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal);
                if sort_by == SortBy::PriceDesc && pa != f64::MAX && pb != f64::MAX {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        SortBy::DateAsc => items.sort_by_key(|i| i.product.created_at),
        SortBy::DateDesc => {
            items.sort_by_key(|i| std::cmp::Reverse(i.product.created_at));
        }
    }
}
