//! Price visibility filter.
//!
//! Pure predicate deciding whether one raw observation may be shown to
//! consumers. Used both at query time and when building the statistics
//! window, so the two never disagree about what "currently visible" means.

use crate::domain::entities::observation::{RunType, SourceObservation};
use crate::domain::entities::retailer::{MerchantLink, Retailer, RetailerStatus, SourceAdapterStatus};

/// A price is consumer-visible only if the retailer is eligible, its
/// merchant link (when one exists) is listed and active, and scrape-sourced
/// observations additionally pass every adapter guardrail. A missing adapter
/// hides a scrape-run observation regardless of how correct its price is.
pub fn is_visible(
    obs: &SourceObservation,
    retailer: &Retailer,
    merchant_link: Option<&MerchantLink>,
    adapter: Option<&SourceAdapterStatus>,
) -> bool {
    if retailer.status != RetailerStatus::Eligible {
        return false;
    }
    if let Some(link) = merchant_link {
        if !link.listed || !link.active {
            return false;
        }
    }
    if obs.run_type == RunType::Scrape {
        match adapter {
            Some(a) => a.robots_compliant && a.tos_compliant && a.enabled,
            None => false,
        }
    } else {
        true
    }
}
