use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureRating {
    Standard,
    PlusP,
    PlusPPlus,
}

impl fmt::Display for PressureRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureRating::Standard => write!(f, "standard"),
            PressureRating::PlusP => write!(f, "plus_p"),
            PressureRating::PlusPPlus => write!(f, "plus_p_plus"),
        }
    }
}

impl FromStr for PressureRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(PressureRating::Standard),
            "plus_p" | "+p" => Ok(PressureRating::PlusP),
            "plus_p_plus" | "+p+" => Ok(PressureRating::PlusPPlus),
            _ => Err(format!("Unknown pressure rating: {s}")),
        }
    }
}
