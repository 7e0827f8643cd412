use crate::domain::entities::product::Product;
use crate::domain::error::DomainError;
use crate::domain::values::bullet_type::BulletType;
use crate::domain::values::case_material::CaseMaterial;
use crate::domain::values::pressure_rating::PressureRating;

/// One typed condition in a search predicate. Conditions AND together;
/// alternatives inside a condition (caliber labels, brand lists) OR.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Normalized-containment match against any of the labels
    /// (".223/5.56" arrives pre-split as two labels).
    CaliberMatches(Vec<String>),
    BrandIn(Vec<String>),
    CaseMaterialEq(CaseMaterial),
    BulletTypeEq(BulletType),
    PressureRatingEq(PressureRating),
    GrainBetween(Option<u32>, Option<u32>),
    VelocityBetween(Option<u32>, Option<u32>),
    SubsonicEq(bool),
    ShortBarrelOptimized,
    LowFlash,
    MatchGrade,
}

/// Explicit predicate AST built by the composer; never mutated incrementally
/// by callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPredicate {
    pub conditions: Vec<Condition>,
}

impl SearchPredicate {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// In-memory evaluation of the same semantics the SQL composition
    /// implements; vector retrieval hits are re-checked through this.
    pub fn matches(&self, product: &Product) -> bool {
        self.conditions.iter().all(|c| condition_matches(c, product))
    }
}

fn condition_matches(condition: &Condition, product: &Product) -> bool {
    match condition {
        Condition::CaliberMatches(labels) => labels.iter().any(|l| product.caliber.matches_label(l)),
        Condition::BrandIn(brands) => brands
            .iter()
            .any(|b| b.eq_ignore_ascii_case(product.brand.as_str())),
        Condition::CaseMaterialEq(material) => product.case_material == Some(*material),
        Condition::BulletTypeEq(bullet_type) => product.bullet_type == *bullet_type,
        Condition::PressureRatingEq(rating) => product.pressure_rating == *rating,
        Condition::GrainBetween(min, max) => match product.grain_weight {
            Some(grain) => min.map_or(true, |m| grain >= m) && max.map_or(true, |m| grain <= m),
            None => false,
        },
        Condition::VelocityBetween(min, max) => match product.muzzle_velocity_fps {
            Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
            None => false,
        },
        Condition::SubsonicEq(subsonic) => product.is_subsonic == *subsonic,
        Condition::ShortBarrelOptimized => product.short_barrel_optimized,
        Condition::LowFlash => product.low_flash,
        Condition::MatchGrade => product.match_grade,
    }
}

pub trait ProductRepository: Send + Sync {
    fn add(&self, product: &Product) -> Result<(), DomainError>;
    fn get_by_id(&self, id: &str) -> Result<Option<Product>, DomainError>;
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, DomainError>;
    /// Products matching the predicate, newest first, capped at `limit`.
    fn find(&self, predicate: &SearchPredicate, limit: usize) -> Result<Vec<Product>, DomainError>;
    fn count(&self, predicate: &SearchPredicate) -> Result<usize, DomainError>;
    fn products_missing_vectors(&self) -> Result<Vec<Product>, DomainError>;
}
