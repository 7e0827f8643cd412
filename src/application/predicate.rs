//! Intent/filter merge and predicate composition.
//!
//! Explicit caller filters always win over parsed intent. Caliber is the
//! only dimension that hardens from intent alone; every other intent-derived
//! value stays a ranking signal so an over-confident guess from the intent
//! service cannot zero out the result set.

use crate::application::ranking::IntentSignals;
use crate::domain::ports::intent_parser::ParsedIntent;
use crate::domain::ports::product_repository::{Condition, SearchPredicate};
use crate::domain::values::bullet_type::BulletType;
use crate::domain::values::caliber;
use crate::domain::values::caller_tier::CallerTier;
use crate::domain::values::case_material::CaseMaterial;
use crate::domain::values::pressure_rating::PressureRating;
use crate::domain::values::purpose::Purpose;
use serde::{Deserialize, Serialize};

/// Caller-supplied filters. All hard when present; the trailing group is
/// tier-gated and ignored for standard-tier callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplicitFilters {
    pub category: Option<String>,
    pub purpose: Option<Purpose>,
    pub brand: Option<String>,
    pub case_material: Option<CaseMaterial>,
    pub min_grain: Option<u32>,
    pub max_grain: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
    // Tier-gated fields.
    pub bullet_type: Option<BulletType>,
    pub pressure_rating: Option<PressureRating>,
    pub is_subsonic: Option<bool>,
    pub short_barrel_optimized: Option<bool>,
    pub low_flash: Option<bool>,
    pub match_grade: Option<bool>,
    pub min_velocity: Option<u32>,
    pub max_velocity: Option<u32>,
}

impl ExplicitFilters {
    pub fn is_empty(&self) -> bool {
        *self == ExplicitFilters::default()
    }

    fn without_tier_gated(mut self) -> Self {
        self.bullet_type = None;
        self.pressure_rating = None;
        self.is_subsonic = None;
        self.short_barrel_optimized = None;
        self.low_flash = None;
        self.match_grade = None;
        self.min_velocity = None;
        self.max_velocity = None;
        self
    }
}

/// Price/stock conditions are resolved through the price join, not the
/// product predicate, so they post-filter the attached price lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceConditions {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock_only: bool,
}

impl PriceConditions {
    pub fn is_empty(&self) -> bool {
        *self == PriceConditions::default()
    }
}

/// The merged view of one search request after explicit filters have been
/// overlaid on parsed intent.
#[derive(Debug, Clone, Default)]
pub struct MergedQuery {
    /// Caliber labels that harden into the predicate; possibly several when
    /// they come from intent.
    pub caliber_labels: Vec<String>,
    pub explicit: ExplicitFilters,
    pub intent: ParsedIntent,
    pub price: PriceConditions,
    pub has_explicit_filters: bool,
}

pub fn merge(intent: ParsedIntent, explicit: ExplicitFilters, tier: CallerTier) -> MergedQuery {
    let explicit = match tier {
        CallerTier::Elevated => explicit,
        CallerTier::Standard => explicit.without_tier_gated(),
    };
    // Computed after tier gating: filters that were just ignored must not
    // influence retrieval strategy selection.
    let has_explicit_filters = !explicit.is_empty();

    let mut intent = intent;
    let caliber_labels: Vec<String> = match &explicit.category {
        Some(category) => {
            // An explicit category override invalidates category-specific
            // derived attributes such as grain-weight hints.
            let same = intent
                .calibers
                .iter()
                .any(|c| caliber::normalize(c) == caliber::normalize(category));
            if !same {
                intent.grain_weights.clear();
            }
            vec![category.clone()]
        }
        None => intent.calibers.clone(),
    };

    let price = PriceConditions {
        min_price: explicit.min_price.or(intent.min_price),
        max_price: explicit.max_price.or(intent.max_price),
        in_stock_only: explicit.in_stock.or(intent.in_stock_only).unwrap_or(false),
    };

    MergedQuery {
        caliber_labels,
        explicit,
        intent,
        price,
        has_explicit_filters,
    }
}

impl MergedQuery {
    /// Build the typed predicate. Caliber hardens whenever known; all other
    /// dimensions only from explicit filters.
    pub fn compose(&self) -> SearchPredicate {
        let mut conditions = Vec::new();

        let labels: Vec<String> = self
            .caliber_labels
            .iter()
            .flat_map(|l| l.split('/'))
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if !labels.is_empty() {
            conditions.push(Condition::CaliberMatches(labels));
        }

        if let Some(brand) = &self.explicit.brand {
            conditions.push(Condition::BrandIn(vec![brand.clone()]));
        }
        if let Some(material) = self.explicit.case_material {
            conditions.push(Condition::CaseMaterialEq(material));
        }
        if self.explicit.min_grain.is_some() || self.explicit.max_grain.is_some() {
            conditions.push(Condition::GrainBetween(self.explicit.min_grain, self.explicit.max_grain));
        }
        if self.explicit.min_velocity.is_some() || self.explicit.max_velocity.is_some() {
            conditions.push(Condition::VelocityBetween(
                self.explicit.min_velocity,
                self.explicit.max_velocity,
            ));
        }
        if let Some(bullet_type) = self.explicit.bullet_type {
            conditions.push(Condition::BulletTypeEq(bullet_type));
        }
        if let Some(rating) = self.explicit.pressure_rating {
            conditions.push(Condition::PressureRatingEq(rating));
        }
        if let Some(subsonic) = self.explicit.is_subsonic {
            conditions.push(Condition::SubsonicEq(subsonic));
        }
        if self.explicit.short_barrel_optimized == Some(true) {
            conditions.push(Condition::ShortBarrelOptimized);
        }
        if self.explicit.low_flash == Some(true) {
            conditions.push(Condition::LowFlash);
        }
        if self.explicit.match_grade == Some(true) {
            conditions.push(Condition::MatchGrade);
        }

        SearchPredicate { conditions }
    }

    /// True when the caller explicitly constrained price or stock.
    /// Intent-guessed price bounds do not count.
    pub fn has_explicit_price_conditions(&self) -> bool {
        self.explicit.min_price.is_some()
            || self.explicit.max_price.is_some()
            || self.explicit.in_stock.is_some()
    }

    /// Intent-derived signals for the scorer. Explicit purpose wins here
    /// too; performance hints only ever arrive from intent.
    pub fn intent_signals(&self, retrieval_score: Option<f64>) -> IntentSignals {
        let performance = self.intent.performance.clone().unwrap_or_default();
        IntentSignals {
            retrieval_score,
            purpose: self.explicit.purpose.or(self.intent.purpose),
            ranking_boosts: performance.ranking_boosts,
            safety_constraints: performance.safety_constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_category_discards_foreign_grain_hints() {
        let intent = ParsedIntent {
            calibers: vec!["9mm Luger".into()],
            grain_weights: vec![124, 147],
            ..Default::default()
        };
        let explicit = ExplicitFilters {
            category: Some(".45 ACP".into()),
            ..Default::default()
        };
        let merged = merge(intent, explicit, CallerTier::Elevated);
        assert!(merged.intent.grain_weights.is_empty());
        assert_eq!(merged.caliber_labels, vec![".45 ACP".to_string()]);
    }

    #[test]
    fn same_category_keeps_grain_hints() {
        let intent = ParsedIntent {
            calibers: vec!["9mm luger".into()],
            grain_weights: vec![124],
            ..Default::default()
        };
        let explicit = ExplicitFilters {
            category: Some("9MM Luger".into()),
            ..Default::default()
        };
        let merged = merge(intent, explicit, CallerTier::Elevated);
        assert_eq!(merged.intent.grain_weights, vec![124]);
    }

    #[test]
    fn intent_attributes_never_harden() {
        let intent = ParsedIntent {
            calibers: vec![".223/5.56".into()],
            brands: vec!["Acme".into()],
            purpose: Some(Purpose::Defense),
            ..Default::default()
        };
        let merged = merge(intent, ExplicitFilters::default(), CallerTier::Elevated);
        let predicate = merged.compose();
        assert_eq!(
            predicate.conditions,
            vec![Condition::CaliberMatches(vec![".223".into(), "5.56".into()])]
        );
        assert!(!merged.has_explicit_filters);
    }

    #[test]
    fn tier_gated_fields_dropped_for_standard_callers() {
        let explicit = ExplicitFilters {
            bullet_type: Some(BulletType::Jhp),
            min_velocity: Some(1000),
            brand: Some("Acme".into()),
            ..Default::default()
        };
        let merged = merge(ParsedIntent::default(), explicit, CallerTier::Standard);
        let predicate = merged.compose();
        assert_eq!(predicate.conditions, vec![Condition::BrandIn(vec!["Acme".into()])]);
    }

    #[test]
    fn tier_gated_only_filters_do_not_count_as_explicit() {
        let explicit = ExplicitFilters {
            bullet_type: Some(BulletType::Jhp),
            min_velocity: Some(1000),
            ..Default::default()
        };
        let merged = merge(ParsedIntent::default(), explicit, CallerTier::Standard);
        assert!(!merged.has_explicit_filters);
        assert!(merged.compose().is_empty());
    }

    #[test]
    fn intent_price_guess_is_not_an_explicit_price_condition() {
        let intent = ParsedIntent {
            min_price: Some(10.0),
            ..Default::default()
        };
        let merged = merge(intent, ExplicitFilters::default(), CallerTier::Elevated);
        assert!(!merged.price.is_empty());
        assert!(!merged.has_explicit_price_conditions());

        let explicit = ExplicitFilters {
            in_stock: Some(true),
            ..Default::default()
        };
        let merged = merge(ParsedIntent::default(), explicit, CallerTier::Elevated);
        assert!(merged.has_explicit_price_conditions());
    }

    #[test]
    fn explicit_price_wins_over_intent_price() {
        let intent = ParsedIntent {
            min_price: Some(10.0),
            max_price: Some(50.0),
            in_stock_only: Some(true),
            ..Default::default()
        };
        let explicit = ExplicitFilters {
            max_price: Some(30.0),
            ..Default::default()
        };
        let merged = merge(intent, explicit, CallerTier::Elevated);
        assert_eq!(merged.price.min_price, Some(10.0));
        assert_eq!(merged.price.max_price, Some(30.0));
        assert!(merged.price.in_stock_only);
    }
}
