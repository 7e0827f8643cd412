pub mod corrections;
pub mod ingest;
pub mod predicate;
pub mod price_resolver;
pub mod price_signal;
pub mod price_stats;
pub mod ranking;
pub mod reindex;
pub mod response;
pub mod search;
pub mod visibility;
