//! Composite ranking scorer.
//!
//! Pure and deterministic: base retrieval relevance (0-40), performance /
//! intent match (0-30), price-signal contribution (0-20) and safety bonus
//! (0-10), capped at 100, plus badges and a short descriptive rationale.
//! The rationale never recommends; it only states what contributed.

use crate::domain::entities::product::Product;
use crate::domain::ports::intent_parser::{RankingBoost, SafetyConstraint};
use crate::domain::values::bullet_type::BulletType;
use crate::domain::values::caliber::Caliber;
use crate::domain::values::context_band::ContextBand;
use crate::domain::values::purpose::Purpose;

use crate::application::price_signal::PriceSignal;
use serde::Serialize;

const BASE_RELEVANCE_MAX: f64 = 40.0;
const BASE_RELEVANCE_NEUTRAL: f64 = 20.0;
const INTENT_MATCH_MAX: f64 = 30.0;
const PRICE_CONTRIBUTION_MAX: f64 = 20.0;
const SAFETY_BONUS_MAX: f64 = 10.0;
const POINTS_PER_BOOST: f64 = 8.0;
const POINTS_PER_CONSTRAINT: f64 = 5.0;

/// Intent-derived signals feeding the scorer. Soft by construction: these
/// never filtered the candidate set, they only rank it.
#[derive(Debug, Clone, Default)]
pub struct IntentSignals {
    /// Retrieval-stage score normalized to 0..1 (vector similarity or
    /// heuristic keyword match); None defaults to a neutral midpoint.
    pub retrieval_score: Option<f64>,
    pub purpose: Option<Purpose>,
    pub ranking_boosts: Vec<RankingBoost>,
    pub safety_constraints: Vec<SafetyConstraint>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base_relevance: f64,
    pub intent_match: f64,
    pub price_context: f64,
    pub safety_bonus: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResult {
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
    pub badges: Vec<String>,
    pub explanation: String,
}

pub fn score(product: &Product, signals: &IntentSignals, price_signal: Option<&PriceSignal>) -> RankingResult {
    let base_relevance = signals
        .retrieval_score
        .map(|s| s.clamp(0.0, 1.0) * BASE_RELEVANCE_MAX)
        .unwrap_or(BASE_RELEVANCE_NEUTRAL);

    let intent_match = if signals.ranking_boosts.is_empty() {
        purpose_heuristic(product, signals.purpose)
    } else {
        boost_points(product, &signals.ranking_boosts)
    };

    let price_context = match price_signal {
        Some(sig) if sig.context_band != ContextBand::InsufficientData => {
            (1.0 - sig.position_in_range) * PRICE_CONTRIBUTION_MAX
        }
        _ => 0.0,
    };

    let safety_bonus = safety_points(product, &signals.safety_constraints);

    let breakdown = ScoreBreakdown {
        base_relevance,
        intent_match,
        price_context,
        safety_bonus,
    };
    let final_score = (base_relevance + intent_match + price_context + safety_bonus).min(100.0);

    RankingResult {
        final_score,
        badges: badges(product, price_signal),
        explanation: explanation(product, signals, price_signal, &breakdown),
        breakdown,
    }
}

fn boost_matches(product: &Product, boost: RankingBoost) -> bool {
    match boost {
        RankingBoost::ShortBarrelOptimized => product.short_barrel_optimized,
        RankingBoost::LowFlash => product.low_flash,
        RankingBoost::ControlledExpansion => product.bullet_type.is_controlled_expansion(),
        RankingBoost::SuppressorSafe => product.is_subsonic,
        RankingBoost::MatchGrade => product.match_grade || product.bullet_type.is_match_oriented(),
    }
}

fn boost_points(product: &Product, boosts: &[RankingBoost]) -> f64 {
    let matched = boosts.iter().filter(|b| boost_matches(product, **b)).count();
    (matched as f64 * POINTS_PER_BOOST).min(INTENT_MATCH_MAX)
}

/// Coarse purpose heuristic used when the intent service supplied no
/// explicit boosts: reward or penalize bullet-type categories for the
/// stated use.
fn purpose_heuristic(product: &Product, purpose: Option<Purpose>) -> f64 {
    let Some(purpose) = purpose else {
        return 0.0;
    };
    let neutral = 10.0_f64;
    let adjustment = match purpose {
        Purpose::Defense => {
            if product.bullet_type.is_controlled_expansion() {
                12.0
            } else if product.bullet_type == BulletType::Fmj {
                -6.0
            } else {
                0.0
            }
        }
        Purpose::Target => {
            if product.bullet_type == BulletType::Fmj {
                8.0
            } else if product.bullet_type.is_controlled_expansion() {
                -4.0
            } else {
                0.0
            }
        }
        Purpose::Hunting => match product.bullet_type {
            BulletType::SoftPoint | BulletType::BallisticTip => 12.0,
            BulletType::Fmj => -6.0,
            _ => 0.0,
        },
        Purpose::Competition => {
            if product.match_grade || product.bullet_type.is_match_oriented() {
                12.0
            } else {
                0.0
            }
        }
        Purpose::Suppressor => {
            if product.is_subsonic {
                12.0
            } else {
                -8.0
            }
        }
    };
    (neutral + adjustment).clamp(0.0, INTENT_MATCH_MAX)
}

fn constraint_matches(product: &Product, constraint: SafetyConstraint) -> bool {
    match constraint {
        SafetyConstraint::LowOverpenetration => product.bullet_type.is_controlled_expansion(),
        SafetyConstraint::LowRecoil => match (product.grain_weight, typical_grain(&product.caliber)) {
            (Some(grain), Some(typical)) => grain < typical,
            _ => false,
        },
    }
}

fn safety_points(product: &Product, constraints: &[SafetyConstraint]) -> f64 {
    let matched = constraints.iter().filter(|c| constraint_matches(product, **c)).count();
    (matched as f64 * POINTS_PER_CONSTRAINT).min(SAFETY_BONUS_MAX)
}

/// Rough typical grain weight per common caliber, used only for the
/// low-recoil heuristic. Unknown calibers simply never match it.
fn typical_grain(caliber: &Caliber) -> Option<u32> {
    let norm = caliber.normalized();
    let table: &[(&str, u32)] = &[
        ("9mm", 124),
        ("380", 90),
        ("10mm", 180),
        (".45", 230),
        ("45 acp", 230),
        ("40", 165),
        ("38 special", 130),
        ("357", 158),
        ("5.56", 62),
        (".223", 62),
        ("300 blackout", 125),
        ("300 blk", 125),
        ("308", 150),
        ("7.62x51", 150),
        ("7.62x39", 123),
        ("6.5 creedmoor", 140),
    ];
    table
        .iter()
        .find(|(label, _)| norm.contains(label))
        .map(|(_, grain)| *grain)
}

fn badges(product: &Product, price_signal: Option<&PriceSignal>) -> Vec<String> {
    let mut badges = Vec::new();
    if product.match_grade {
        badges.push("match-grade".to_string());
    }
    if product.is_subsonic {
        badges.push("subsonic".to_string());
    }
    if product.low_flash {
        badges.push("low-flash".to_string());
    }
    if product.short_barrel_optimized {
        badges.push("short-barrel".to_string());
    }
    if product.bullet_type.is_controlled_expansion() {
        badges.push("controlled-expansion".to_string());
    }
    if let Some(sig) = price_signal {
        if sig.context_band == ContextBand::Low {
            badges.push("below-typical-range".to_string());
        }
    }
    badges
}

/// Short descriptive rationale from the dominant contributing factors.
/// Deliberately free of prescriptive language.
fn explanation(
    product: &Product,
    signals: &IntentSignals,
    price_signal: Option<&PriceSignal>,
    breakdown: &ScoreBreakdown,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if breakdown.intent_match > INTENT_MATCH_MAX / 2.0 {
        match signals.purpose {
            Some(p) => parts.push(format!("aligns with {p} use")),
            None => parts.push("matches the requested performance profile".to_string()),
        }
    }

    match price_signal.map(|s| s.context_band) {
        Some(ContextBand::Low) => parts.push(format!(
            "currently priced below the typical range for {}",
            product.caliber
        )),
        Some(ContextBand::High) => parts.push(format!(
            "currently priced above the typical range for {}",
            product.caliber
        )),
        Some(ContextBand::Typical) => {
            parts.push(format!("priced within the typical range for {}", product.caliber))
        }
        Some(ContextBand::InsufficientData) | None => {
            parts.push("limited recent price history for context".to_string())
        }
    }

    if breakdown.safety_bonus > 0.0 {
        parts.push("meets the stated safety preferences".to_string());
    }

    let mut text = parts.join("; ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    format!("{text}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::price_stats::STATS_WINDOW_DAYS;
    use chrono::Utc;

    fn product(bullet_type: BulletType) -> Product {
        Product::new(
            "Test Load".into(),
            "Acme".into(),
            Caliber::new("9mm Luger"),
            bullet_type,
            Some(124),
            Some(50),
        )
    }

    fn signal(position: f64, band: ContextBand) -> PriceSignal {
        PriceSignal {
            relative_price_pct: 0.0,
            position_in_range: position,
            context_band: band,
            window_days: STATS_WINDOW_DAYS,
            sample_count: 10,
            as_of: Utc::now(),
        }
    }

    #[test]
    fn neutral_base_when_retrieval_score_absent() {
        let result = score(&product(BulletType::Fmj), &IntentSignals::default(), None);
        assert_eq!(result.breakdown.base_relevance, 20.0);
        assert_eq!(result.breakdown.intent_match, 0.0);
        assert_eq!(result.breakdown.price_context, 0.0);
    }

    #[test]
    fn cheaper_position_contributes_more() {
        let signals = IntentSignals::default();
        let cheap = score(&product(BulletType::Fmj), &signals, Some(&signal(0.1, ContextBand::Low)));
        let dear = score(&product(BulletType::Fmj), &signals, Some(&signal(0.9, ContextBand::High)));
        assert!(cheap.breakdown.price_context > dear.breakdown.price_context);
        assert!((cheap.breakdown.price_context - 18.0).abs() < 1e-9);
    }

    #[test]
    fn insufficient_signal_contributes_nothing() {
        let result = score(
            &product(BulletType::Fmj),
            &IntentSignals::default(),
            Some(&signal(0.0, ContextBand::InsufficientData)),
        );
        assert_eq!(result.breakdown.price_context, 0.0);
    }

    #[test]
    fn boosts_trump_purpose_heuristic() {
        let mut p = product(BulletType::Jhp);
        p.short_barrel_optimized = true;
        p.low_flash = true;
        let signals = IntentSignals {
            purpose: Some(Purpose::Target),
            ranking_boosts: vec![
                RankingBoost::ShortBarrelOptimized,
                RankingBoost::LowFlash,
                RankingBoost::ControlledExpansion,
            ],
            ..Default::default()
        };
        let result = score(&p, &signals, None);
        assert_eq!(result.breakdown.intent_match, 24.0);
    }

    #[test]
    fn defense_purpose_rewards_controlled_expansion() {
        let signals = IntentSignals {
            purpose: Some(Purpose::Defense),
            ..Default::default()
        };
        let jhp = score(&product(BulletType::Jhp), &signals, None);
        let fmj = score(&product(BulletType::Fmj), &signals, None);
        assert!(jhp.breakdown.intent_match > fmj.breakdown.intent_match);
    }

    #[test]
    fn safety_constraints_add_capped_bonus() {
        let mut p = product(BulletType::Jhp);
        p.grain_weight = Some(115); // below typical 124 for 9mm
        let signals = IntentSignals {
            safety_constraints: vec![SafetyConstraint::LowOverpenetration, SafetyConstraint::LowRecoil],
            ..Default::default()
        };
        let result = score(&p, &signals, None);
        assert_eq!(result.breakdown.safety_bonus, 10.0);
    }

    #[test]
    fn final_score_capped_at_100() {
        let mut p = product(BulletType::Jhp);
        p.grain_weight = Some(115);
        p.short_barrel_optimized = true;
        p.low_flash = true;
        p.match_grade = true;
        p.is_subsonic = true;
        let signals = IntentSignals {
            retrieval_score: Some(1.0),
            ranking_boosts: vec![
                RankingBoost::ShortBarrelOptimized,
                RankingBoost::LowFlash,
                RankingBoost::ControlledExpansion,
                RankingBoost::SuppressorSafe,
                RankingBoost::MatchGrade,
            ],
            safety_constraints: vec![SafetyConstraint::LowOverpenetration, SafetyConstraint::LowRecoil],
            ..Default::default()
        };
        let result = score(&p, &signals, Some(&signal(0.0, ContextBand::Low)));
        assert_eq!(result.final_score, 100.0);
    }

    #[test]
    fn explanation_avoids_prescriptive_language() {
        let result = score(
            &product(BulletType::Jhp),
            &IntentSignals {
                purpose: Some(Purpose::Defense),
                ..Default::default()
            },
            Some(&signal(0.1, ContextBand::Low)),
        );
        let lower = result.explanation.to_lowercase();
        for forbidden in ["buy", "guaranteed", "deal"] {
            assert!(!lower.contains(forbidden), "explanation contains {forbidden:?}: {lower}");
        }
    }
}
