//! Correction resolution.
//!
//! Corrections are time-boxed manual overrides on raw observations. The
//! index is built once per resolve pass from the corrections overlapping the
//! lookback window and answered per observation with a range scan keyed by
//! start time, rather than a per-row subquery.

use crate::domain::entities::correction::{Correction, CorrectionKind};
use crate::domain::entities::observation::SourceObservation;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// How corrections resolved for one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionOutcome {
    Unchanged,
    Adjusted(f64),
    /// An Ignore applied, or more than two multipliers stacked. Fail-closed.
    Excluded,
}

pub struct CorrectionIndex {
    /// Corrections bucketed by start time; a scan up to the observation
    /// timestamp visits every interval that could contain it.
    by_start: BTreeMap<DateTime<Utc>, Vec<Correction>>,
}

/// At most this many multiplier corrections may stack on one observation;
/// beyond it the data is considered too contested to show.
const MAX_STACKED_MULTIPLIERS: usize = 2;

impl CorrectionIndex {
    pub fn new(corrections: Vec<Correction>) -> Self {
        let mut by_start: BTreeMap<DateTime<Utc>, Vec<Correction>> = BTreeMap::new();
        for c in corrections {
            if c.revoked || c.ends_at <= c.starts_at {
                continue;
            }
            by_start.entry(c.starts_at).or_default().push(c);
        }
        Self { by_start }
    }

    /// Resolve the corrected price for `obs` once its product is known.
    pub fn resolve(&self, obs: &SourceObservation, product_id: &str) -> CorrectionOutcome {
        let mut factor = 1.0_f64;
        let mut multipliers = 0usize;

        for (_, bucket) in self.by_start.range(..=obs.observed_at) {
            for c in bucket {
                if !c.applies_to(obs, product_id) {
                    continue;
                }
                match c.kind {
                    CorrectionKind::Ignore => return CorrectionOutcome::Excluded,
                    CorrectionKind::Multiplier { factor: f } => {
                        multipliers += 1;
                        if multipliers > MAX_STACKED_MULTIPLIERS {
                            return CorrectionOutcome::Excluded;
                        }
                        factor *= f;
                    }
                }
            }
        }

        if multipliers == 0 {
            CorrectionOutcome::Unchanged
        } else {
            CorrectionOutcome::Adjusted(obs.price * factor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::correction::CorrectionScope;
    use crate::domain::entities::observation::RunType;
    use chrono::Duration;

    fn obs_at(observed_at: DateTime<Utc>) -> SourceObservation {
        SourceObservation::new(
            "src-1".into(),
            "ret-1".into(),
            100.0,
            true,
            observed_at,
            RunType::Affiliate,
            "run-1".into(),
            "https://example.com".into(),
        )
    }

    fn multiplier(factor: f64, scope: CorrectionScope, start: DateTime<Utc>, end: DateTime<Utc>) -> Correction {
        Correction::new(CorrectionKind::Multiplier { factor }, scope, start, end)
    }

    #[test]
    fn single_multiplier_scales_price() {
        let now = Utc::now();
        let idx = CorrectionIndex::new(vec![multiplier(
            0.1,
            CorrectionScope::Retailer("ret-1".into()),
            now - Duration::days(1),
            now + Duration::days(1),
        )]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Adjusted(10.0));
    }

    #[test]
    fn two_multipliers_combine_by_product() {
        let now = Utc::now();
        let idx = CorrectionIndex::new(vec![
            multiplier(0.5, CorrectionScope::Retailer("ret-1".into()), now - Duration::days(1), now + Duration::days(1)),
            multiplier(2.0, CorrectionScope::Product("prod-1".into()), now - Duration::days(2), now + Duration::days(1)),
        ]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Adjusted(100.0));
    }

    #[test]
    fn three_multipliers_exclude_fail_closed() {
        let now = Utc::now();
        let idx = CorrectionIndex::new(vec![
            multiplier(0.5, CorrectionScope::Retailer("ret-1".into()), now - Duration::days(1), now + Duration::days(1)),
            multiplier(2.0, CorrectionScope::Product("prod-1".into()), now - Duration::days(2), now + Duration::days(1)),
            multiplier(1.1, CorrectionScope::Source("src-1".into()), now - Duration::days(3), now + Duration::days(1)),
        ]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Excluded);
    }

    #[test]
    fn ignore_wins_over_multipliers() {
        let now = Utc::now();
        let idx = CorrectionIndex::new(vec![
            multiplier(0.5, CorrectionScope::Retailer("ret-1".into()), now - Duration::days(1), now + Duration::days(1)),
            Correction::new(
                CorrectionKind::Ignore,
                CorrectionScope::Source("src-1".into()),
                now - Duration::days(1),
                now + Duration::days(1),
            ),
        ]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Excluded);
    }

    #[test]
    fn interval_is_half_open_and_revocation_respected() {
        let now = Utc::now();
        let start = now - Duration::days(2);
        let end = now;
        let idx = CorrectionIndex::new(vec![multiplier(0.5, CorrectionScope::Retailer("ret-1".into()), start, end)]);
        // observed exactly at end: outside [start, end)
        assert_eq!(idx.resolve(&obs_at(end), "prod-1"), CorrectionOutcome::Unchanged);
        assert_eq!(idx.resolve(&obs_at(start), "prod-1"), CorrectionOutcome::Adjusted(50.0));

        let mut revoked = multiplier(0.5, CorrectionScope::Retailer("ret-1".into()), start, now + Duration::days(1));
        revoked.revoked = true;
        let idx = CorrectionIndex::new(vec![revoked]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Unchanged);
    }

    #[test]
    fn unrelated_scopes_do_not_apply() {
        let now = Utc::now();
        let idx = CorrectionIndex::new(vec![multiplier(
            0.5,
            CorrectionScope::Retailer("other".into()),
            now - Duration::days(1),
            now + Duration::days(1),
        )]);
        assert_eq!(idx.resolve(&obs_at(now), "prod-1"), CorrectionOutcome::Unchanged);
    }
}
