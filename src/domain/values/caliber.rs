use serde::{Deserialize, Serialize};
use std::fmt;

/// Ammunition caliber label. Comparison is done on a normalized form so
/// feed variants like ".223/5.56", "5.56 NATO" and "5.56x45mm" line up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caliber(String);

impl Caliber {
    pub fn new(label: impl Into<String>) -> Self {
        Caliber(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased, whitespace-collapsed form used as a cache key and for
    /// containment matching.
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }

    /// A filter label may name alternatives separated by '/'
    /// (".223/5.56"). A caliber matches when its normalized form contains
    /// any normalized alternative.
    pub fn matches_label(&self, label: &str) -> bool {
        let norm = self.normalized();
        label
            .split('/')
            .map(normalize)
            .filter(|alt| !alt.is_empty())
            .any(|alt| norm.contains(&alt))
    }
}

pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Caliber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Caliber {
    fn from(s: &str) -> Self {
        Caliber(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_either_alternative() {
        let c = Caliber::new("5.56x45mm NATO");
        assert!(c.matches_label(".223/5.56"));
        let c = Caliber::new(".223 Remington");
        assert!(c.matches_label(".223/5.56"));
    }

    #[test]
    fn no_match_for_unrelated_caliber() {
        let c = Caliber::new("9mm Luger");
        assert!(!c.matches_label(".223/5.56"));
    }

    #[test]
    fn normalization_is_case_and_space_insensitive() {
        assert_eq!(normalize("  9MM   Luger "), "9mm luger");
    }
}
