use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Defense,
    Target,
    Hunting,
    Competition,
    Suppressor,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::Defense => write!(f, "defense"),
            Purpose::Target => write!(f, "target"),
            Purpose::Hunting => write!(f, "hunting"),
            Purpose::Competition => write!(f, "competition"),
            Purpose::Suppressor => write!(f, "suppressor"),
        }
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "defense" | "self-defense" => Ok(Purpose::Defense),
            "target" | "range" | "plinking" => Ok(Purpose::Target),
            "hunting" => Ok(Purpose::Hunting),
            "competition" | "match" => Ok(Purpose::Competition),
            "suppressor" | "suppressed" => Ok(Purpose::Suppressor),
            _ => Err(format!("Unknown purpose: {s}")),
        }
    }
}
