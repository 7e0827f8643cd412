//! Response shaping.
//!
//! One canonical internal representation (`RankedProduct`) and a single
//! projection function over it for both caller tiers, so the two shapes can
//! never drift apart field-by-field. The serialized output must never leak
//! the forbidden internal fields, at any depth; `contains_forbidden_field`
//! is the recursive checker the tests (and debug builds) run against every
//! produced response.

use crate::application::price_signal::PriceSignal;
use crate::application::ranking::RankingResult;
use crate::domain::entities::product::Product;
use crate::domain::entities::visible_price::VisiblePrice;
use crate::domain::ports::lens::LensOutcome;
use crate::domain::values::caller_tier::CallerTier;
use crate::domain::values::context_band::ContextBand;
use crate::domain::values::sort_order::SortBy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Internal field names that must never appear in serialized consumer
/// output, at any nesting depth. Includes the legacy scoring fields of the
/// pre-rework responses.
pub const FORBIDDEN_FIELDS: &[&str] = &[
    "linkConfidence",
    "resolutionConfidence",
    "matchConfidence",
    "retrievalScore",
    "completenessHint",
    "dealScore",
    "internalScore",
    "rawScore",
];

/// The canonical internal representation of one result row. Everything the
/// pipeline learned lives here; the projection decides what leaves.
#[derive(Debug, Clone)]
pub struct RankedProduct {
    pub product: Product,
    pub prices: Vec<VisiblePrice>,
    pub signal: Option<PriceSignal>,
    pub ranking: Option<RankingResult>,
    pub retrieval_score: Option<f64>,
    pub resolution_confidence: f64,
}

impl RankedProduct {
    pub fn cheapest_price(&self) -> Option<f64> {
        self.prices
            .iter()
            .map(|p| p.price)
            .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.min(p))))
    }

    pub fn cheapest_price_per_round(&self) -> Option<f64> {
        self.prices
            .iter()
            .filter_map(|p| p.price_per_round)
            .fold(None, |acc, p| Some(acc.map_or(p, |a: f64| a.min(p))))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePrice {
    pub retailer: String,
    pub retailer_tier: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_round: Option<f64>,
    pub in_stock: bool,
    pub observed_at: DateTime<Utc>,
    pub url: String,
}

/// Price context: band for everyone, numeric breakdown for elevated callers
/// only. The `None` fields serialize away entirely for the standard tier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceContext {
    pub band: ContextBand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_price_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_in_range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseProduct {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub caliber: String,
    pub bullet_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grain_weight: Option<u32>,
    pub pressure_rating: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muzzle_velocity_fps: Option<u32>,
    pub is_subsonic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_material: Option<String>,
    pub short_barrel_optimized: bool,
    pub low_flash: bool,
    pub match_grade: bool,
    /// Cheapest visible price; null for lens-retained zero-price rows.
    pub price: Option<f64>,
    pub price_context: PriceContext,
    pub prices: Vec<ResponsePrice>,
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub calibers: Vec<FacetCount>,
    pub brands: Vec<FacetCount>,
    pub bullet_types: Vec<FacetCount>,
    pub case_materials: Vec<FacetCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self { page, limit, total, total_pages }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub query: String,
    /// "vector" or "relational".
    pub strategy: String,
    pub fell_back: bool,
    pub sort_by: SortBy,
    pub intent_confidence: f64,
    pub tier: CallerTier,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInfo {
    pub id: String,
    pub auto_applied: bool,
    pub reason_code: String,
    pub zero_eligible: bool,
}

impl PipelineInfo {
    pub fn from_outcome(id: &str, outcome: &LensOutcome) -> Self {
        Self {
            id: id.to_string(),
            auto_applied: outcome.auto_applied,
            reason_code: outcome.reason_code.clone(),
            zero_eligible: outcome.zero_eligible,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub products: Vec<ResponseProduct>,
    pub facets: Facets,
    pub pagination: Pagination,
    pub search_metadata: SearchMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineInfo>,
}

/// The single tier projection. Both tiers flow through here; the only
/// difference is whether the numeric signal fields survive.
pub fn project_product(item: &RankedProduct, tier: CallerTier) -> ResponseProduct {
    let band = item
        .signal
        .as_ref()
        .map(|s| s.context_band)
        .unwrap_or(ContextBand::InsufficientData);

    let price_context = match (tier, item.signal.as_ref()) {
        (CallerTier::Elevated, Some(sig)) => PriceContext {
            band,
            relative_price_pct: Some(sig.relative_price_pct),
            position_in_range: Some(sig.position_in_range),
            window_days: Some(sig.window_days),
            sample_count: Some(sig.sample_count),
            as_of: Some(sig.as_of),
        },
        _ => PriceContext {
            band,
            relative_price_pct: None,
            position_in_range: None,
            window_days: None,
            sample_count: None,
            as_of: None,
        },
    };

    let product = &item.product;
    ResponseProduct {
        id: product.id.clone(),
        name: product.name.clone(),
        brand: product.brand.clone(),
        caliber: product.caliber.to_string(),
        bullet_type: product.bullet_type.to_string(),
        grain_weight: product.grain_weight,
        pressure_rating: product.pressure_rating.to_string(),
        muzzle_velocity_fps: product.muzzle_velocity_fps,
        is_subsonic: product.is_subsonic,
        round_count: product.round_count,
        case_material: product.case_material.map(|m| m.to_string()),
        short_barrel_optimized: product.short_barrel_optimized,
        low_flash: product.low_flash,
        match_grade: product.match_grade,
        price: item.cheapest_price(),
        price_context,
        prices: item
            .prices
            .iter()
            .map(|p| ResponsePrice {
                retailer: p.retailer_name.clone(),
                retailer_tier: p.retailer_tier.to_string(),
                price: p.price,
                price_per_round: p.price_per_round,
                in_stock: p.in_stock,
                observed_at: p.observed_at,
                url: p.url.clone(),
            })
            .collect(),
        badges: item.ranking.as_ref().map(|r| r.badges.clone()).unwrap_or_default(),
        explanation: item.ranking.as_ref().map(|r| r.explanation.clone()),
    }
}

/// Facets in a single pass over the matching rows, not one query per
/// dimension.
pub fn build_facets(products: &[Product]) -> Facets {
    let mut calibers: Vec<FacetCount> = Vec::new();
    let mut brands: Vec<FacetCount> = Vec::new();
    let mut bullet_types: Vec<FacetCount> = Vec::new();
    let mut case_materials: Vec<FacetCount> = Vec::new();

    fn bump(counts: &mut Vec<FacetCount>, value: String) {
        match counts.iter_mut().find(|c| c.value == value) {
            Some(c) => c.count += 1,
            None => counts.push(FacetCount { value, count: 1 }),
        }
    }

    for product in products {
        bump(&mut calibers, product.caliber.to_string());
        bump(&mut brands, product.brand.clone());
        bump(&mut bullet_types, product.bullet_type.to_string());
        if let Some(material) = product.case_material {
            bump(&mut case_materials, material.to_string());
        }
    }

    for counts in [&mut calibers, &mut brands, &mut bullet_types, &mut case_materials] {
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    }

    Facets { calibers, brands, bullet_types, case_materials }
}

/// Recursive scan for forbidden fields; returns the first offender found.
pub fn contains_forbidden_field(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if FORBIDDEN_FIELDS.contains(&key.as_str()) {
                    return Some(key.clone());
                }
                if let Some(found) = contains_forbidden_field(inner) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items.iter().find_map(contains_forbidden_field),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn forbidden_scan_finds_nested_offenders() {
        let clean = json!({"products": [{"price": 1.0, "nested": {"band": "LOW"}}]});
        assert_eq!(contains_forbidden_field(&clean), None);

        let dirty = json!({"products": [{"meta": [{"dealScore": 92}]}]});
        assert_eq!(contains_forbidden_field(&dirty), Some("dealScore".to_string()));
    }

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
    }
}
