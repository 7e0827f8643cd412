use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Relevance,
    PriceAsc,
    PriceDesc,
    DateAsc,
    DateDesc,
    PriceContext,
}

impl SortBy {
    /// The default order; a lens pipeline's ordering is only authoritative
    /// when the caller did not ask for anything else.
    pub fn is_default(&self) -> bool {
        matches!(self, SortBy::Relevance)
    }
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::Relevance
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Relevance => write!(f, "relevance"),
            SortBy::PriceAsc => write!(f, "price_asc"),
            SortBy::PriceDesc => write!(f, "price_desc"),
            SortBy::DateAsc => write!(f, "date_asc"),
            SortBy::DateDesc => write!(f, "date_desc"),
            SortBy::PriceContext => write!(f, "price_context"),
        }
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "price_asc" => Ok(SortBy::PriceAsc),
            "price_desc" => Ok(SortBy::PriceDesc),
            "date_asc" => Ok(SortBy::DateAsc),
            "date_desc" => Ok(SortBy::DateDesc),
            "price_context" => Ok(SortBy::PriceContext),
            _ => Err(format!("Unknown sort order: {s}")),
        }
    }
}
