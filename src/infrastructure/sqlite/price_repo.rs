use crate::domain::entities::correction::{Correction, CorrectionKind, CorrectionScope};
use crate::domain::entities::observation::{RunType, SourceObservation};
use crate::domain::entities::resolution_link::ResolutionLink;
use crate::domain::entities::retailer::{MerchantLink, Retailer, RetailerStatus, SourceAdapterStatus};
use crate::domain::error::DomainError;
use crate::domain::ports::price_repository::{PriceRepository, PriceRow};
use crate::domain::values::caliber;
use crate::domain::values::retailer_tier::RetailerTier;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::Mutex;

/// Joined column list shared by both row queries. The join resolves
/// everything visibility and correction logic needs in one round trip.
const ROW_SELECT: &str = "o.id, o.source_item_id, o.retailer_id, o.price, o.currency, o.in_stock, o.observed_at, o.run_type, o.run_id, o.shipping_cost, o.url, \
     l.product_id, l.confidence, p.round_count, \
     r.name, r.tier, r.status, \
     m.listed, m.active, \
     a.robots_compliant, a.tos_compliant, a.enabled";

const ROW_FROM: &str = " FROM source_observations o \
     JOIN resolution_links l ON l.source_item_id = o.source_item_id \
     JOIN products p ON p.id = l.product_id \
     JOIN retailers r ON r.id = o.retailer_id \
     LEFT JOIN merchant_links m ON m.retailer_id = r.id \
     LEFT JOIN source_adapters a ON a.retailer_id = r.id";

pub struct SqlitePriceRepo {
    conn: Mutex<Connection>,
}

impl SqlitePriceRepo {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn parse_time(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_price_row(row: &rusqlite::Row) -> Result<PriceRow, rusqlite::Error> {
        let observed_str: String = row.get(6)?;
        let run_type_str: String = row.get(7)?;
        let tier_str: String = row.get(15)?;
        let status_str: String = row.get(16)?;
        let listed: Option<i32> = row.get(17)?;
        let active: Option<i32> = row.get(18)?;
        let robots: Option<i32> = row.get(19)?;
        let tos: Option<i32> = row.get(20)?;
        let enabled: Option<i32> = row.get(21)?;

        let retailer_id: String = row.get(2)?;

        let observation = SourceObservation {
            id: row.get(0)?,
            source_item_id: row.get(1)?,
            retailer_id: retailer_id.clone(),
            price: row.get(3)?,
            currency: row.get(4)?,
            in_stock: row.get::<_, i32>(5)? != 0,
            observed_at: Self::parse_time(&observed_str),
            run_type: run_type_str.parse().unwrap_or(RunType::Affiliate),
            run_id: row.get(8)?,
            shipping_cost: row.get(9)?,
            url: row.get(10)?,
        };

        let merchant_link = match (listed, active) {
            (Some(listed), Some(active)) => Some(MerchantLink {
                retailer_id: retailer_id.clone(),
                listed: listed != 0,
                active: active != 0,
            }),
            _ => None,
        };

        let adapter = match (robots, tos, enabled) {
            (Some(robots), Some(tos), Some(enabled)) => Some(SourceAdapterStatus {
                retailer_id: retailer_id.clone(),
                robots_compliant: robots != 0,
                tos_compliant: tos != 0,
                enabled: enabled != 0,
            }),
            _ => None,
        };

        Ok(PriceRow {
            observation,
            product_id: row.get(11)?,
            round_count: row.get(13)?,
            link_confidence: row.get(12)?,
            retailer: Retailer {
                id: retailer_id,
                name: row.get(14)?,
                tier: tier_str.parse().unwrap_or(RetailerTier::Standard),
                status: status_str.parse().unwrap_or(RetailerStatus::Delisted),
            },
            merchant_link,
            adapter,
        })
    }

    fn row_to_correction(row: &rusqlite::Row) -> Result<Correction, rusqlite::Error> {
        let kind_str: String = row.get(1)?;
        let factor: Option<f64> = row.get(2)?;
        let scope_str: String = row.get(3)?;
        let scope_id: String = row.get(4)?;
        let starts_str: String = row.get(5)?;
        let ends_str: String = row.get(6)?;

        let kind = match kind_str.as_str() {
            "ignore" => CorrectionKind::Ignore,
            _ => CorrectionKind::Multiplier {
                factor: factor.unwrap_or(1.0),
            },
        };
        let scope = match scope_str.as_str() {
            "product" => CorrectionScope::Product(scope_id),
            "retailer" => CorrectionScope::Retailer(scope_id),
            "source" => CorrectionScope::Source(scope_id),
            "affiliate_channel" => CorrectionScope::AffiliateChannel(scope_id),
            _ => CorrectionScope::FeedRun(scope_id),
        };

        Ok(Correction {
            id: row.get(0)?,
            kind,
            scope,
            starts_at: Self::parse_time(&starts_str),
            ends_at: Self::parse_time(&ends_str),
            revoked: row.get::<_, i32>(7)? != 0,
        })
    }

    fn scope_columns(scope: &CorrectionScope) -> (&'static str, &str) {
        match scope {
            CorrectionScope::Product(id) => ("product", id),
            CorrectionScope::Retailer(id) => ("retailer", id),
            CorrectionScope::Source(id) => ("source", id),
            CorrectionScope::AffiliateChannel(id) => ("affiliate_channel", id),
            CorrectionScope::FeedRun(id) => ("feed_run", id),
        }
    }
}

impl PriceRepository for SqlitePriceRepo {
    fn price_rows(&self, product_ids: &[String], since: DateTime<Utc>) -> Result<Vec<PriceRow>, DomainError> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let placeholders: Vec<String> = (2..=product_ids.len() + 1).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT {ROW_SELECT}{ROW_FROM} WHERE o.observed_at >= ?1 AND l.product_id IN ({})",
            placeholders.join(", ")
        );

        let since_str = since.to_rfc3339();
        let mut params_refs: Vec<&dyn rusqlite::types::ToSql> = vec![&since_str];
        for id in product_ids {
            params_refs.push(id);
        }

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::row_to_price_row)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn rows_for_caliber(&self, caliber_label: &str, since: DateTime<Utc>) -> Result<Vec<PriceRow>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(since.to_rfc3339())];
        let mut alternatives = Vec::new();
        for alt in caliber_label.split('/') {
            let escaped = caliber::normalize(alt)
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            if escaped.is_empty() {
                continue;
            }
            alternatives.push(format!("p.caliber_norm LIKE ?{} ESCAPE '\\'", param_values.len() + 1));
            param_values.push(Box::new(format!("%{escaped}%")));
        }
        if alternatives.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!(
            "SELECT {ROW_SELECT}{ROW_FROM} WHERE o.observed_at >= ?1 AND ({})",
            alternatives.join(" OR ")
        );
        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::row_to_price_row)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    fn corrections_overlapping(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Correction>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, kind, factor, scope, scope_id, starts_at, ends_at, revoked
                 FROM corrections WHERE starts_at < ?1 AND ends_at > ?2",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let corrections = stmt
            .query_map(params![until.to_rfc3339(), since.to_rfc3339()], Self::row_to_correction)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(corrections)
    }

    fn add_retailer(&self, retailer: &Retailer) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO retailers (id, name, tier, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                retailer.id,
                retailer.name,
                retailer.tier.to_string(),
                retailer.status.to_string()
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add retailer: {e}")))?;
        Ok(())
    }

    fn add_merchant_link(&self, link: &MerchantLink) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO merchant_links (retailer_id, listed, active) VALUES (?1, ?2, ?3)",
            params![link.retailer_id, link.listed as i32, link.active as i32],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add merchant link: {e}")))?;
        Ok(())
    }

    fn add_adapter(&self, adapter: &SourceAdapterStatus) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO source_adapters (retailer_id, robots_compliant, tos_compliant, enabled)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                adapter.retailer_id,
                adapter.robots_compliant as i32,
                adapter.tos_compliant as i32,
                adapter.enabled as i32
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add adapter: {e}")))?;
        Ok(())
    }

    fn add_observation(&self, obs: &SourceObservation) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO source_observations (id, source_item_id, retailer_id, price, currency, in_stock, observed_at, run_type, run_id, shipping_cost, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                obs.id,
                obs.source_item_id,
                obs.retailer_id,
                obs.price,
                obs.currency,
                obs.in_stock as i32,
                obs.observed_at.to_rfc3339(),
                obs.run_type.to_string(),
                obs.run_id,
                obs.shipping_cost,
                obs.url,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add observation: {e}")))?;
        Ok(())
    }

    fn add_resolution_link(&self, link: &ResolutionLink) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO resolution_links (id, source_item_id, product_id, status, confidence)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                link.id,
                link.source_item_id,
                link.product_id,
                link.status.to_string(),
                link.confidence
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add resolution link: {e}")))?;
        Ok(())
    }

    fn add_correction(&self, correction: &Correction) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let (kind, factor) = match correction.kind {
            CorrectionKind::Ignore => ("ignore", None),
            CorrectionKind::Multiplier { factor } => ("multiplier", Some(factor)),
        };
        let (scope, scope_id) = Self::scope_columns(&correction.scope);
        conn.execute(
            "INSERT INTO corrections (id, kind, factor, scope, scope_id, starts_at, ends_at, revoked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                correction.id,
                kind,
                factor,
                scope,
                scope_id,
                correction.starts_at.to_rfc3339(),
                correction.ends_at.to_rfc3339(),
                correction.revoked as i32,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to add correction: {e}")))?;
        Ok(())
    }

    fn revoke_correction(&self, id: &str) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let updated = conn
            .execute("UPDATE corrections SET revoked = 1 WHERE id = ?1", params![id])
            .map_err(|e| DomainError::Database(e.to_string()))?;
        if updated == 0 {
            return Err(DomainError::NotFound(format!("correction {id}")));
        }
        Ok(())
    }
}
