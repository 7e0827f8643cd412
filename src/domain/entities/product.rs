use crate::domain::values::bullet_type::BulletType;
use crate::domain::values::caliber::Caliber;
use crate::domain::values::case_material::CaseMaterial;
use crate::domain::values::pressure_rating::PressureRating;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical catalog entry. Created and mutated by the external resolution
/// pipeline; this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub caliber: Caliber,
    pub bullet_type: BulletType,
    pub grain_weight: Option<u32>,
    pub pressure_rating: PressureRating,
    pub muzzle_velocity_fps: Option<u32>,
    pub is_subsonic: bool,
    pub round_count: Option<u32>,
    pub case_material: Option<CaseMaterial>,
    pub short_barrel_optimized: bool,
    pub low_flash: bool,
    pub match_grade: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        brand: String,
        caliber: Caliber,
        bullet_type: BulletType,
        grain_weight: Option<u32>,
        round_count: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            brand,
            caliber,
            bullet_type,
            grain_weight,
            pressure_rating: PressureRating::Standard,
            muzzle_velocity_fps: None,
            is_subsonic: false,
            round_count,
            case_material: None,
            short_barrel_optimized: false,
            low_flash: false,
            match_grade: false,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Text representation for embedding/search.
    pub fn searchable_text(&self) -> String {
        let mut parts = vec![
            self.name.clone(),
            self.brand.clone(),
            self.caliber.to_string(),
            self.bullet_type.to_string(),
        ];
        if let Some(g) = self.grain_weight {
            parts.push(format!("{g}gr"));
        }
        if let Some(desc) = &self.description {
            parts.push(desc.clone());
        }
        parts.join(" ")
    }
}
