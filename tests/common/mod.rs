//! Shared test helpers.
#![allow(dead_code)]

use ammoscout::application::search::SearchConfig;
use ammoscout::domain::entities::observation::{RunType, SourceObservation};
use ammoscout::domain::entities::product::Product;
use ammoscout::domain::entities::resolution_link::{LinkStatus, ResolutionLink};
use ammoscout::domain::entities::retailer::{Retailer, RetailerStatus};
use ammoscout::domain::ports::clock::{Clock, SystemClock};
use ammoscout::domain::ports::embedding_port::EmbeddingProvider;
use ammoscout::domain::ports::intent_parser::IntentParser;
use ammoscout::domain::ports::lens::LensRegistry;
use ammoscout::domain::values::bullet_type::BulletType;
use ammoscout::domain::values::caliber::Caliber;
use ammoscout::domain::values::retailer_tier::RetailerTier;
use ammoscout::infrastructure::embeddings::noop::NoopProvider;
use ammoscout::infrastructure::intent::noop::NoopIntentParser;
use ammoscout::AmmoScout;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Movable fixed clock so TTL and window behavior is deterministic.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(now) })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A stable reference instant for fixed-clock tests.
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()
}

pub fn setup() -> (AmmoScout, TempDir) {
    setup_full(
        Arc::new(NoopProvider),
        Arc::new(NoopIntentParser),
        LensRegistry::new(),
        Arc::new(SystemClock),
    )
}

pub fn setup_with_clock(clock: Arc<dyn Clock>) -> (AmmoScout, TempDir) {
    setup_full(Arc::new(NoopProvider), Arc::new(NoopIntentParser), LensRegistry::new(), clock)
}

pub fn setup_with_lenses(lenses: LensRegistry) -> (AmmoScout, TempDir) {
    setup_full(Arc::new(NoopProvider), Arc::new(NoopIntentParser), lenses, Arc::new(SystemClock))
}

pub fn setup_full(
    embedder: Arc<dyn EmbeddingProvider>,
    intent_parser: Arc<dyn IntentParser>,
    lenses: LensRegistry,
    clock: Arc<dyn Clock>,
) -> (AmmoScout, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ammoscout.db");
    let engine = AmmoScout::with_providers(
        db_path.to_str().unwrap(),
        embedder,
        intent_parser,
        lenses,
        SearchConfig::default(),
        clock,
    )
    .unwrap();
    (engine, dir)
}

pub fn product(name: &str, brand: &str, caliber: &str, rounds: u32) -> Product {
    Product::new(
        name.to_string(),
        brand.to_string(),
        Caliber::new(caliber),
        BulletType::Fmj,
        Some(115),
        Some(rounds),
    )
}

pub fn retailer(id: &str, name: &str, tier: RetailerTier, status: RetailerStatus) -> Retailer {
    Retailer {
        id: id.to_string(),
        name: name.to_string(),
        tier,
        status,
    }
}

pub fn observation(
    source_item_id: &str,
    retailer_id: &str,
    price: f64,
    in_stock: bool,
    observed_at: DateTime<Utc>,
) -> SourceObservation {
    SourceObservation::new(
        source_item_id.to_string(),
        retailer_id.to_string(),
        price,
        in_stock,
        observed_at,
        RunType::Affiliate,
        "run-1".to_string(),
        format!("https://shop.test/{source_item_id}"),
    )
}

pub fn scrape_observation(
    source_item_id: &str,
    retailer_id: &str,
    price: f64,
    observed_at: DateTime<Utc>,
) -> SourceObservation {
    SourceObservation::new(
        source_item_id.to_string(),
        retailer_id.to_string(),
        price,
        true,
        observed_at,
        RunType::Scrape,
        "scrape-run-1".to_string(),
        format!("https://shop.test/{source_item_id}"),
    )
}

pub fn link(source_item_id: &str, product_id: &str) -> ResolutionLink {
    ResolutionLink::new(
        source_item_id.to_string(),
        product_id.to_string(),
        LinkStatus::Matched,
        0.9,
    )
}

pub fn days_ago(n: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(n)
}
