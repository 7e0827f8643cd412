use crate::domain::entities::product::Product;
use crate::domain::error::DomainError;
use crate::domain::ports::product_repository::*;
use crate::domain::values::bullet_type::BulletType;
use crate::domain::values::caliber::{self, Caliber};
use crate::domain::values::pressure_rating::PressureRating;
use chrono::DateTime;
use rusqlite::{params, Connection};
use std::sync::Mutex;

const SELECT_COLS: &str = "id, name, brand, caliber, bullet_type, grain_weight, pressure_rating, muzzle_velocity_fps, is_subsonic, round_count, case_material, short_barrel_optimized, low_flash, match_grade, description, created_at, updated_at";

pub struct SqliteProductRepo {
    conn: Mutex<Connection>,
}

impl SqliteProductRepo {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn row_to_product(row: &rusqlite::Row) -> Result<Product, rusqlite::Error> {
        let bullet_str: String = row.get(4)?;
        let pressure_str: String = row.get(6)?;
        let material_str: Option<String> = row.get(10)?;
        let created_str: String = row.get(15)?;
        let updated_str: String = row.get(16)?;

        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            brand: row.get(2)?,
            caliber: Caliber::new(row.get::<_, String>(3)?),
            bullet_type: bullet_str.parse().unwrap_or(BulletType::Other),
            grain_weight: row.get(5)?,
            pressure_rating: pressure_str.parse().unwrap_or(PressureRating::Standard),
            muzzle_velocity_fps: row.get(7)?,
            is_subsonic: row.get::<_, i32>(8)? != 0,
            round_count: row.get(9)?,
            case_material: material_str.and_then(|s| s.parse().ok()),
            short_barrel_optimized: row.get::<_, i32>(11)? != 0,
            low_flash: row.get::<_, i32>(12)? != 0,
            match_grade: row.get::<_, i32>(13)? != 0,
            description: row.get(14)?,
            created_at: DateTime::parse_from_rfc3339(&created_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&updated_str)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }

    /// Translate the typed predicate into a WHERE clause with numbered
    /// parameters. Must agree with `SearchPredicate::matches`.
    fn where_clause(
        predicate: &SearchPredicate,
        param_values: &mut Vec<Box<dyn rusqlite::types::ToSql>>,
    ) -> String {
        let mut sql = String::from(" WHERE 1=1");

        for condition in &predicate.conditions {
            match condition {
                Condition::CaliberMatches(labels) => {
                    let mut parts = Vec::new();
                    for label in labels {
                        let escaped = caliber::normalize(label)
                            .replace('\\', "\\\\")
                            .replace('%', "\\%")
                            .replace('_', "\\_");
                        parts.push(format!("caliber_norm LIKE ?{} ESCAPE '\\'", param_values.len() + 1));
                        param_values.push(Box::new(format!("%{escaped}%")));
                    }
                    if !parts.is_empty() {
                        sql.push_str(&format!(" AND ({})", parts.join(" OR ")));
                    }
                }
                Condition::BrandIn(brands) => {
                    let mut parts = Vec::new();
                    for brand in brands {
                        parts.push(format!("LOWER(brand) = LOWER(?{})", param_values.len() + 1));
                        param_values.push(Box::new(brand.clone()));
                    }
                    if !parts.is_empty() {
                        sql.push_str(&format!(" AND ({})", parts.join(" OR ")));
                    }
                }
                Condition::CaseMaterialEq(material) => {
                    sql.push_str(&format!(" AND case_material = ?{}", param_values.len() + 1));
                    param_values.push(Box::new(material.to_string()));
                }
                Condition::BulletTypeEq(bullet_type) => {
                    sql.push_str(&format!(" AND bullet_type = ?{}", param_values.len() + 1));
                    param_values.push(Box::new(bullet_type.to_string()));
                }
                Condition::PressureRatingEq(rating) => {
                    sql.push_str(&format!(" AND pressure_rating = ?{}", param_values.len() + 1));
                    param_values.push(Box::new(rating.to_string()));
                }
                Condition::GrainBetween(min, max) => {
                    sql.push_str(" AND grain_weight IS NOT NULL");
                    if let Some(min) = min {
                        sql.push_str(&format!(" AND grain_weight >= ?{}", param_values.len() + 1));
                        param_values.push(Box::new(*min as i64));
                    }
                    if let Some(max) = max {
                        sql.push_str(&format!(" AND grain_weight <= ?{}", param_values.len() + 1));
                        param_values.push(Box::new(*max as i64));
                    }
                }
                Condition::VelocityBetween(min, max) => {
                    sql.push_str(" AND muzzle_velocity_fps IS NOT NULL");
                    if let Some(min) = min {
                        sql.push_str(&format!(" AND muzzle_velocity_fps >= ?{}", param_values.len() + 1));
                        param_values.push(Box::new(*min as i64));
                    }
                    if let Some(max) = max {
                        sql.push_str(&format!(" AND muzzle_velocity_fps <= ?{}", param_values.len() + 1));
                        param_values.push(Box::new(*max as i64));
                    }
                }
                Condition::SubsonicEq(subsonic) => {
                    sql.push_str(&format!(" AND is_subsonic = ?{}", param_values.len() + 1));
                    param_values.push(Box::new(*subsonic as i32));
                }
                Condition::ShortBarrelOptimized => sql.push_str(" AND short_barrel_optimized = 1"),
                Condition::LowFlash => sql.push_str(" AND low_flash = 1"),
                Condition::MatchGrade => sql.push_str(" AND match_grade = 1"),
            }
        }

        sql
    }
}

impl ProductRepository for SqliteProductRepo {
    fn add(&self, product: &Product) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO products (id, name, brand, caliber, caliber_norm, bullet_type, grain_weight, pressure_rating, muzzle_velocity_fps, is_subsonic, round_count, case_material, short_barrel_optimized, low_flash, match_grade, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                product.id,
                product.name,
                product.brand,
                product.caliber.as_str(),
                product.caliber.normalized(),
                product.bullet_type.to_string(),
                product.grain_weight,
                product.pressure_rating.to_string(),
                product.muzzle_velocity_fps,
                product.is_subsonic as i32,
                product.round_count,
                product.case_material.map(|m| m.to_string()),
                product.short_barrel_optimized as i32,
                product.low_flash as i32,
                product.match_grade as i32,
                product.description,
                product.created_at.to_rfc3339(),
                product.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add product: {e}")))?;
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Product>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!("SELECT {} FROM products WHERE id = ?1", SELECT_COLS);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut rows = stmt
            .query_map(params![id], Self::row_to_product)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(rows.next().and_then(|r| r.ok()))
    }

    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, DomainError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT {} FROM products WHERE id IN ({})",
            SELECT_COLS,
            placeholders.join(", ")
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let products = stmt
            .query_map(params_refs.as_slice(), Self::row_to_product)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(products)
    }

    fn find(&self, predicate: &SearchPredicate, limit: usize) -> Result<Vec<Product>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut sql = format!("SELECT {} FROM products", SELECT_COLS);
        sql.push_str(&Self::where_clause(predicate, &mut param_values));
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ?{}", param_values.len() + 1));
        param_values.push(Box::new(limit as i64));

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let products = stmt
            .query_map(params_refs.as_slice(), Self::row_to_product)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(products)
    }

    fn count(&self, predicate: &SearchPredicate) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut sql = String::from("SELECT COUNT(*) FROM products");
        sql.push_str(&Self::where_clause(predicate, &mut param_values));

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let count: usize = conn
            .query_row(&sql, params_refs.as_slice(), |r| r.get(0))
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(count)
    }

    fn products_missing_vectors(&self) -> Result<Vec<Product>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!(
            "SELECT {} FROM products WHERE id NOT IN (SELECT id FROM vectors)",
            SELECT_COLS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let products = stmt
            .query_map([], Self::row_to_product)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(products)
    }
}
