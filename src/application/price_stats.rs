//! Caliber price statistics cache.
//!
//! Percentile snapshot over daily-best price-per-round within a trailing
//! window, computed from corrections-applied, currently-visible observations
//! only. Entries live behind a TTL and are recomputed lazily on the next
//! access; concurrent misses may recompute redundantly, last write wins.

use crate::application::corrections::{CorrectionIndex, CorrectionOutcome};
use crate::application::visibility::is_visible;
use crate::domain::error::DomainError;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::price_repository::{PriceRepository, PriceRow};
use crate::domain::values::caliber;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const STATS_WINDOW_DAYS: i64 = 30;
pub const STATS_TTL_SECONDS: i64 = 3600;
/// Below this many daily samples the snapshot never classifies a price.
pub const MIN_SAMPLES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaliberPriceStats {
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    /// True qualifying-sample count, reported even when below threshold.
    /// Callers must check this, not mere presence of the record.
    pub sample_count: usize,
    pub window_days: i64,
    pub as_of: DateTime<Utc>,
}

impl CaliberPriceStats {
    pub fn is_meaningful(&self) -> bool {
        self.sample_count >= MIN_SAMPLES
    }
}

struct CacheEntry {
    stats: CaliberPriceStats,
    cached_at: DateTime<Utc>,
}

pub struct CaliberStatsCache {
    price_repo: Arc<dyn PriceRepository>,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    window_days: i64,
}

impl CaliberStatsCache {
    pub fn new(price_repo: Arc<dyn PriceRepository>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(price_repo, clock, Duration::seconds(STATS_TTL_SECONDS), STATS_WINDOW_DAYS)
    }

    pub fn with_ttl(
        price_repo: Arc<dyn PriceRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        window_days: i64,
    ) -> Self {
        Self {
            price_repo,
            clock,
            entries: Mutex::new(HashMap::new()),
            ttl,
            window_days,
        }
    }

    pub fn get_stats(&self, caliber_label: &str) -> Result<CaliberPriceStats, DomainError> {
        let key = caliber::normalize(caliber_label);
        let now = self.clock.now();

        {
            let entries = self
                .entries
                .lock()
                .map_err(|e| DomainError::Database(e.to_string()))?;
            if let Some(entry) = entries.get(&key) {
                if now - entry.cached_at < self.ttl {
                    return Ok(entry.stats.clone());
                }
            }
        }

        // Recompute outside the lock; concurrent misses doing the same work
        // is acceptable, the results are identical.
        let stats = self.compute(caliber_label, now)?;

        let mut entries = self
            .entries
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        entries.insert(key, CacheEntry { stats: stats.clone(), cached_at: now });
        Ok(stats)
    }

    /// Drop a cached entry so the next access recomputes.
    pub fn invalidate(&self, caliber_label: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&caliber::normalize(caliber_label));
        }
    }

    /// Pre-populate common calibers at startup. Failures are logged and
    /// skipped; warming is an optimization, never a correctness requirement.
    pub fn warm(&self, caliber_labels: &[String]) {
        for label in caliber_labels {
            if let Err(e) = self.get_stats(label) {
                tracing::warn!(caliber = %label, error = %e, "stats warm-up failed");
            }
        }
    }

    fn compute(&self, caliber_label: &str, now: DateTime<Utc>) -> Result<CaliberPriceStats, DomainError> {
        let since = now - Duration::days(self.window_days);
        let rows = self.price_repo.rows_for_caliber(caliber_label, since)?;
        let corrections = self.price_repo.corrections_overlapping(since, now)?;
        let index = CorrectionIndex::new(corrections);

        let samples = daily_best_price_per_round(&rows, &index);
        Ok(stats_from_samples(&samples, self.window_days, now))
    }
}

/// One sample per calendar day: the lowest corrections-applied
/// price-per-round among visible observations that day. Observations with
/// missing or non-positive round counts contribute nothing.
fn daily_best_price_per_round(rows: &[PriceRow], index: &CorrectionIndex) -> Vec<f64> {
    let mut best_by_day: HashMap<NaiveDate, f64> = HashMap::new();

    for row in rows {
        if !is_visible(
            &row.observation,
            &row.retailer,
            row.merchant_link.as_ref(),
            row.adapter.as_ref(),
        ) {
            continue;
        }
        let price = match index.resolve(&row.observation, &row.product_id) {
            CorrectionOutcome::Unchanged => row.observation.price,
            CorrectionOutcome::Adjusted(p) => p,
            CorrectionOutcome::Excluded => continue,
        };
        let Some(rounds) = row.round_count.filter(|&n| n > 0) else {
            continue;
        };
        let ppr = price / rounds as f64;

        let day = row.observation.observed_at.date_naive();
        best_by_day
            .entry(day)
            .and_modify(|b| {
                if ppr < *b {
                    *b = ppr;
                }
            })
            .or_insert(ppr);
    }

    let mut samples: Vec<f64> = best_by_day.into_values().collect();
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    samples
}

fn stats_from_samples(sorted: &[f64], window_days: i64, as_of: DateTime<Utc>) -> CaliberPriceStats {
    if sorted.len() < MIN_SAMPLES {
        return CaliberPriceStats {
            sample_count: sorted.len(),
            window_days,
            as_of,
            ..Default::default()
        };
    }
    CaliberPriceStats {
        median: percentile(sorted, 0.5),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        p25: percentile(sorted, 0.25),
        p75: percentile(sorted, 0.75),
        sample_count: sorted.len(),
        window_days,
        as_of,
    }
}

/// Continuous-interpolation percentile over an ascending-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&v, 0.5) - 2.5).abs() < 1e-9);
        assert!((percentile(&v, 0.25) - 1.75).abs() < 1e-9);
        assert!((percentile(&v, 0.0) - 1.0).abs() < 1e-9);
        assert!((percentile(&v, 1.0) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_yields_zeroed_stats_with_true_count() {
        let samples = vec![0.3, 0.4, 0.5];
        let stats = stats_from_samples(&samples, STATS_WINDOW_DAYS, Utc::now());
        assert_eq!(stats.sample_count, 3);
        assert!(!stats.is_meaningful());
        assert_eq!(stats.median, 0.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
    }

    #[test]
    fn five_samples_are_meaningful() {
        let samples = vec![0.2, 0.3, 0.4, 0.5, 0.6];
        let stats = stats_from_samples(&samples, STATS_WINDOW_DAYS, Utc::now());
        assert!(stats.is_meaningful());
        assert!((stats.median - 0.4).abs() < 1e-9);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.6);
    }
}
