use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletType {
    Fmj,
    Jhp,
    BondedJhp,
    SoftPoint,
    BallisticTip,
    Otm,
    Frangible,
    Other,
}

impl BulletType {
    /// Bullet types designed to expand or break up on impact rather than
    /// overpenetrate.
    pub fn is_controlled_expansion(&self) -> bool {
        matches!(
            self,
            BulletType::Jhp
                | BulletType::BondedJhp
                | BulletType::SoftPoint
                | BulletType::BallisticTip
                | BulletType::Frangible
        )
    }

    pub fn is_match_oriented(&self) -> bool {
        matches!(self, BulletType::Otm)
    }
}

impl fmt::Display for BulletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulletType::Fmj => write!(f, "fmj"),
            BulletType::Jhp => write!(f, "jhp"),
            BulletType::BondedJhp => write!(f, "bonded_jhp"),
            BulletType::SoftPoint => write!(f, "soft_point"),
            BulletType::BallisticTip => write!(f, "ballistic_tip"),
            BulletType::Otm => write!(f, "otm"),
            BulletType::Frangible => write!(f, "frangible"),
            BulletType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for BulletType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fmj" => Ok(BulletType::Fmj),
            "jhp" => Ok(BulletType::Jhp),
            "bonded_jhp" | "bonded-jhp" => Ok(BulletType::BondedJhp),
            "soft_point" | "sp" => Ok(BulletType::SoftPoint),
            "ballistic_tip" => Ok(BulletType::BallisticTip),
            "otm" => Ok(BulletType::Otm),
            "frangible" => Ok(BulletType::Frangible),
            "other" => Ok(BulletType::Other),
            _ => Err(format!("Unknown bullet type: {s}")),
        }
    }
}
