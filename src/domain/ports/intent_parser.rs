use crate::domain::error::DomainError;
use crate::domain::values::case_material::CaseMaterial;
use crate::domain::values::purpose::Purpose;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured performance hints the intent service may attach to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingBoost {
    ShortBarrelOptimized,
    LowFlash,
    ControlledExpansion,
    SuppressorSafe,
    MatchGrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyConstraint {
    LowOverpenetration,
    LowRecoil,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceIntent {
    #[serde(default)]
    pub ranking_boosts: Vec<RankingBoost>,
    #[serde(default)]
    pub safety_constraints: Vec<SafetyConstraint>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub barrel_length_in: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Budget,
    Standard,
    Premium,
}

/// Output of the external natural-language intent service. Everything here
/// is a guess: only the caliber becomes a hard filter, the rest feeds
/// ranking so an over-constrained guess cannot zero out results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedIntent {
    #[serde(default)]
    pub calibers: Vec<String>,
    #[serde(default)]
    pub purpose: Option<Purpose>,
    #[serde(default)]
    pub grain_weights: Vec<u32>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub case_materials: Vec<CaseMaterial>,
    #[serde(default)]
    pub quality_level: Option<QualityLevel>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub in_stock_only: Option<bool>,
    #[serde(default)]
    pub performance: Option<PerformanceIntent>,
}

#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn parse(&self, query: &str) -> Result<ParsedIntent, DomainError>;
}
