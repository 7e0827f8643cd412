use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMaterial {
    Brass,
    Steel,
    Aluminum,
    Nickel,
}

impl fmt::Display for CaseMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseMaterial::Brass => write!(f, "brass"),
            CaseMaterial::Steel => write!(f, "steel"),
            CaseMaterial::Aluminum => write!(f, "aluminum"),
            CaseMaterial::Nickel => write!(f, "nickel"),
        }
    }
}

impl FromStr for CaseMaterial {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brass" => Ok(CaseMaterial::Brass),
            "steel" => Ok(CaseMaterial::Steel),
            "aluminum" | "aluminium" => Ok(CaseMaterial::Aluminum),
            "nickel" | "nickel-plated" => Ok(CaseMaterial::Nickel),
            _ => Err(format!("Unknown case material: {s}")),
        }
    }
}
