//! Price signal calculator.
//!
//! Converts a product's cheapest eligible price into descriptive context
//! against the caliber's trailing-window statistics. Descriptive only: a
//! relative percentage, a normalized position and a qualitative band,
//! never a verdict.

use crate::application::price_stats::{CaliberPriceStats, CaliberStatsCache};
use crate::domain::entities::product::Product;
use crate::domain::entities::visible_price::VisiblePrice;
use crate::domain::error::DomainError;
use crate::domain::values::context_band::ContextBand;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Cap on concurrent per-item calculations in the batch path, so a large
/// candidate page cannot stampede the statistics layer.
const MAX_CONCURRENT_SIGNALS: usize = 10;

const LOW_BAND_CEILING: f64 = 0.30;
const HIGH_BAND_FLOOR: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSignal {
    pub relative_price_pct: f64,
    pub position_in_range: f64,
    pub context_band: ContextBand,
    pub window_days: i64,
    pub sample_count: usize,
    pub as_of: DateTime<Utc>,
}

impl PriceSignal {
    pub fn insufficient(window_days: i64, sample_count: usize, as_of: DateTime<Utc>) -> Self {
        Self {
            relative_price_pct: 0.0,
            position_in_range: 0.0,
            context_band: ContextBand::InsufficientData,
            window_days,
            sample_count,
            as_of,
        }
    }
}

#[derive(Clone)]
pub struct SignalCalculator {
    stats_cache: Arc<CaliberStatsCache>,
}

impl SignalCalculator {
    pub fn new(stats_cache: Arc<CaliberStatsCache>) -> Self {
        Self { stats_cache }
    }

    /// Signal for one product given its resolved visible prices. Statistics
    /// failures degrade to `InsufficientData` rather than failing the
    /// request.
    pub fn calculate(&self, product: &Product, prices: &[VisiblePrice]) -> PriceSignal {
        let Some(reference) = cheapest_eligible(prices) else {
            return PriceSignal::insufficient(
                crate::application::price_stats::STATS_WINDOW_DAYS,
                0,
                Utc::now(),
            );
        };

        let stats = match self.stats_cache.get_stats(product.caliber.as_str()) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(product_id = %product.id, error = %e, "stats unavailable, degrading signal");
                return PriceSignal::insufficient(
                    crate::application::price_stats::STATS_WINDOW_DAYS,
                    0,
                    Utc::now(),
                );
            }
        };

        let Some(ppr) = reference.price_per_round else {
            return PriceSignal::insufficient(stats.window_days, stats.sample_count, stats.as_of);
        };

        signal_from_stats(ppr, &stats)
    }

    /// Batch variant with bounded fan-out. Output keyed by product id.
    pub async fn calculate_batch(
        &self,
        items: Vec<(Product, Vec<VisiblePrice>)>,
    ) -> Result<HashMap<String, PriceSignal>, DomainError> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SIGNALS));
        let mut join_set = JoinSet::new();

        for (product, prices) in items {
            let calc = self.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| DomainError::Database(e.to_string()))?;
                let signal = calc.calculate(&product, &prices);
                Ok::<_, DomainError>((product.id, signal))
            });
        }

        let mut signals = HashMap::new();
        while let Some(joined) = join_set.join_next().await {
            let (id, signal) = joined.map_err(|e| DomainError::Database(e.to_string()))??;
            signals.insert(id, signal);
        }
        Ok(signals)
    }
}

/// Cheapest in-stock price, falling back to the cheapest at any stock
/// status; None when no visible price exists at all.
fn cheapest_eligible(prices: &[VisiblePrice]) -> Option<&VisiblePrice> {
    let by_price = |a: &&VisiblePrice, b: &&VisiblePrice| {
        a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal)
    };
    prices
        .iter()
        .filter(|p| p.in_stock)
        .min_by(by_price)
        .or_else(|| prices.iter().min_by(by_price))
}

fn signal_from_stats(ppr: f64, stats: &CaliberPriceStats) -> PriceSignal {
    if !stats.is_meaningful() {
        return PriceSignal::insufficient(stats.window_days, stats.sample_count, stats.as_of);
    }

    let relative_price_pct = if stats.median == 0.0 {
        0.0
    } else {
        (ppr - stats.median) / stats.median * 100.0
    };

    let range = stats.max - stats.min;
    let position_in_range = if range == 0.0 {
        0.5
    } else {
        ((ppr - stats.min) / range).clamp(0.0, 1.0)
    };

    let context_band = if position_in_range <= LOW_BAND_CEILING {
        ContextBand::Low
    } else if position_in_range >= HIGH_BAND_FLOOR {
        ContextBand::High
    } else {
        ContextBand::Typical
    };

    PriceSignal {
        relative_price_pct,
        position_in_range,
        context_band,
        window_days: stats.window_days,
        sample_count: stats.sample_count,
        as_of: stats.as_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::price_stats::STATS_WINDOW_DAYS;

    fn stats(median: f64, min: f64, max: f64, samples: usize) -> CaliberPriceStats {
        CaliberPriceStats {
            median,
            min,
            max,
            p25: min,
            p75: max,
            sample_count: samples,
            window_days: STATS_WINDOW_DAYS,
            as_of: Utc::now(),
        }
    }

    #[test]
    fn classifies_low_typical_high() {
        let s = stats(0.50, 0.40, 0.60, 10);
        assert_eq!(signal_from_stats(0.42, &s).context_band, ContextBand::Low);
        assert_eq!(signal_from_stats(0.50, &s).context_band, ContextBand::Typical);
        assert_eq!(signal_from_stats(0.58, &s).context_band, ContextBand::High);
    }

    #[test]
    fn zero_range_pins_position_to_midpoint() {
        let s = stats(0.50, 0.50, 0.50, 10);
        let sig = signal_from_stats(0.50, &s);
        assert_eq!(sig.position_in_range, 0.5);
        assert_eq!(sig.context_band, ContextBand::Typical);
    }

    #[test]
    fn zero_median_yields_zero_relative_pct() {
        let s = stats(0.0, 0.0, 1.0, 10);
        assert_eq!(signal_from_stats(0.5, &s).relative_price_pct, 0.0);
    }

    #[test]
    fn position_clamped_outside_observed_range() {
        let s = stats(0.50, 0.40, 0.60, 10);
        assert_eq!(signal_from_stats(0.10, &s).position_in_range, 0.0);
        assert_eq!(signal_from_stats(5.00, &s).position_in_range, 1.0);
    }

    #[test]
    fn sub_threshold_sample_count_is_insufficient() {
        let s = stats(0.50, 0.40, 0.60, 4);
        let sig = signal_from_stats(0.42, &s);
        assert_eq!(sig.context_band, ContextBand::InsufficientData);
        assert_eq!(sig.relative_price_pct, 0.0);
        assert_eq!(sig.sample_count, 4);
    }
}
