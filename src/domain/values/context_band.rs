use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative price context relative to the caliber's trailing window.
/// Descriptive only; this crate never emits buy/wait verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextBand {
    Low,
    Typical,
    High,
    InsufficientData,
}

impl fmt::Display for ContextBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextBand::Low => write!(f, "LOW"),
            ContextBand::Typical => write!(f, "TYPICAL"),
            ContextBand::High => write!(f, "HIGH"),
            ContextBand::InsufficientData => write!(f, "INSUFFICIENT_DATA"),
        }
    }
}
