mod common;

use ammoscout::application::ingest::ImportBatch;
use ammoscout::application::search::SearchOptions;
use ammoscout::domain::entities::retailer::RetailerStatus;
use ammoscout::domain::error::DomainError;
use ammoscout::domain::ports::clock::SystemClock;
use ammoscout::domain::ports::intent_parser::{IntentParser, ParsedIntent};
use ammoscout::domain::ports::lens::{LensCandidate, LensOutcome, LensPipeline, LensRegistry};
use ammoscout::infrastructure::embeddings::noop::NoopProvider;
use ammoscout::domain::values::retailer_tier::RetailerTier;
use ammoscout::domain::values::sort_order::SortBy;
use ammoscout::AmmoScout;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;

/// Orders candidates by product name descending, keeping all of them.
struct ReverseNameLens;

#[async_trait]
impl LensPipeline for ReverseNameLens {
    fn id(&self) -> &str {
        "reverse-name"
    }

    async fn apply(&self, candidates: &[LensCandidate]) -> Result<LensOutcome, DomainError> {
        let mut ordered: Vec<&LensCandidate> = candidates.iter().collect();
        ordered.sort_by(|a, b| b.product.name.cmp(&a.product.name));
        Ok(LensOutcome {
            ordered_ids: ordered.iter().map(|c| c.product.id.clone()).collect(),
            auto_applied: false,
            reason_code: "reverse_name".into(),
            zero_eligible: candidates.is_empty(),
        })
    }
}

/// Keeps only in-stock candidates.
struct InStockLens;

#[async_trait]
impl LensPipeline for InStockLens {
    fn id(&self) -> &str {
        "in-stock"
    }

    async fn apply(&self, candidates: &[LensCandidate]) -> Result<LensOutcome, DomainError> {
        let ordered_ids: Vec<String> = candidates
            .iter()
            .filter(|c| c.in_stock)
            .map(|c| c.product.id.clone())
            .collect();
        Ok(LensOutcome {
            zero_eligible: ordered_ids.is_empty(),
            ordered_ids,
            auto_applied: true,
            reason_code: "in_stock_only".into(),
        })
    }
}

/// Rejects every candidate.
struct RejectAllLens;

#[async_trait]
impl LensPipeline for RejectAllLens {
    fn id(&self) -> &str {
        "reject-all"
    }

    async fn apply(&self, _candidates: &[LensCandidate]) -> Result<LensOutcome, DomainError> {
        Ok(LensOutcome {
            ordered_ids: vec![],
            auto_applied: false,
            reason_code: "nothing_qualified".into(),
            zero_eligible: true,
        })
    }
}

fn registry() -> LensRegistry {
    let mut lenses = LensRegistry::new();
    lenses.register(Arc::new(ReverseNameLens));
    lenses.register(Arc::new(InStockLens));
    lenses.register(Arc::new(RejectAllLens));
    lenses
}

async fn seed(engine: &AmmoScout) -> (String, String, String) {
    let a = product("Alpha", "Acme", "9mm Luger", 50);
    let b = product("Bravo", "Acme", "9mm Luger", 50);
    let c = product("Charlie", "Acme", "9mm Luger", 50);
    let ids = (a.id.clone(), b.id.clone(), c.id.clone());
    engine
        .import(ImportBatch {
            products: vec![a, b, c],
            retailers: vec![retailer("r-1", "Shop", RetailerTier::Standard, RetailerStatus::Eligible)],
            observations: vec![
                observation("src-a", "r-1", 10.0, true, days_ago(1)),
                observation("src-b", "r-1", 15.0, false, days_ago(1)),
                observation("src-c", "r-1", 20.0, true, days_ago(1)),
            ],
            resolution_links: vec![link("src-a", &ids.0), link("src-b", &ids.1), link("src-c", &ids.2)],
            ..Default::default()
        })
        .await
        .unwrap();
    ids
}

fn search_ids(result: &ammoscout::application::response::SearchResult) -> Vec<String> {
    result.products.iter().map(|p| p.id.clone()).collect()
}

#[tokio::test]
async fn test_unknown_pipeline_id_is_an_error() {
    let (engine, _dir) = setup_with_lenses(registry());
    seed(&engine).await;

    let err = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("no-such-lens".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UnknownPipeline(id) if id == "no-such-lens"));
}

#[tokio::test]
async fn test_lens_order_is_authoritative_under_default_sort() {
    let (engine, _dir) = setup_with_lenses(registry());
    let (a, b, c) = seed(&engine).await;

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reverse-name".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(search_ids(&result), vec![c, b, a]);

    let pipeline = result.pipeline.unwrap();
    assert_eq!(pipeline.id, "reverse-name");
    assert_eq!(pipeline.reason_code, "reverse_name");
    assert!(!pipeline.zero_eligible);
}

#[tokio::test]
async fn test_explicit_sort_overrides_lens_order() {
    let (engine, _dir) = setup_with_lenses(registry());
    let (a, b, c) = seed(&engine).await;

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reverse-name".into()),
                sort_by: SortBy::PriceAsc,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(search_ids(&result), vec![a, b, c]);
}

#[tokio::test]
async fn test_lens_filtering_drops_rejected_candidates() {
    let (engine, _dir) = setup_with_lenses(registry());
    let (a, b, c) = seed(&engine).await;

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("in-stock".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids = search_ids(&result);
    assert!(ids.contains(&a));
    assert!(ids.contains(&c));
    assert!(!ids.contains(&b));
    assert!(result.pipeline.unwrap().auto_applied);
}

#[tokio::test]
async fn test_lens_can_reject_everything() {
    let (engine, _dir) = setup_with_lenses(registry());
    seed(&engine).await;

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reject-all".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.products.is_empty());
    assert_eq!(result.pagination.total, 0);
    let pipeline = result.pipeline.unwrap();
    assert!(pipeline.zero_eligible);
    assert_eq!(pipeline.reason_code, "nothing_qualified");
}

#[tokio::test]
async fn test_lens_retains_unpriced_rows_with_null_price_last() {
    let (engine, _dir) = setup_with_lenses(registry());
    let (a, b, c) = seed(&engine).await;

    // "Zulu" would lead the reverse-name ordering, but without any visible
    // price it must surface last, with an explicitly null price.
    let unpriced = product("Zulu", "Acme", "9mm Luger", 50);
    let unpriced_id = unpriced.id.clone();
    engine
        .import(ImportBatch {
            products: vec![unpriced],
            ..Default::default()
        })
        .await
        .unwrap();

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reverse-name".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids = search_ids(&result);
    assert_eq!(ids, vec![c, b, a, unpriced_id.clone()]);

    let json = serde_json::to_value(&result).unwrap();
    let last = &json["products"][3];
    assert_eq!(last["id"], unpriced_id.as_str());
    assert!(last["price"].is_null());
}

/// Guesses a price floor from every query, the way an over-eager intent
/// service would.
struct PriceGuessingIntentParser;

#[async_trait]
impl IntentParser for PriceGuessingIntentParser {
    async fn parse(&self, _query: &str) -> Result<ParsedIntent, DomainError> {
        Ok(ParsedIntent {
            min_price: Some(5.0),
            confidence: 0.8,
            ..Default::default()
        })
    }
}

#[tokio::test]
async fn test_intent_guessed_price_does_not_disable_unpriced_retention() {
    let intent: Arc<dyn IntentParser> = Arc::new(PriceGuessingIntentParser);
    let (engine, _dir) = setup_full(Arc::new(NoopProvider), intent, registry(), Arc::new(SystemClock));
    seed(&engine).await;

    let unpriced = product("Zulu", "Acme", "9mm Luger", 50);
    let unpriced_id = unpriced.id.clone();
    engine
        .import(ImportBatch {
            products: vec![unpriced],
            ..Default::default()
        })
        .await
        .unwrap();

    // The caller gave no price condition; only the intent service guessed
    // one, so the lens still sees the unpriced row.
    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reverse-name".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids = search_ids(&result);
    assert_eq!(ids.last().unwrap(), &unpriced_id);
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_price_filter_disables_unpriced_retention() {
    let (engine, _dir) = setup_with_lenses(registry());
    seed(&engine).await;

    let unpriced = product("Zulu", "Acme", "9mm Luger", 50);
    let unpriced_id = unpriced.id.clone();
    engine
        .import(ImportBatch {
            products: vec![unpriced],
            ..Default::default()
        })
        .await
        .unwrap();

    let result = engine
        .search(
            "9mm",
            SearchOptions {
                pipeline_id: Some("reverse-name".into()),
                filters: ammoscout::application::predicate::ExplicitFilters {
                    max_price: Some(50.0),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(search_ids(&result).iter().all(|id| id != &unpriced_id));
}
