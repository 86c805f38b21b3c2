//! Risk profile categories
//!
//! A single ordered table of closed upper cut points drives both the label
//! and the description of a score: 30, 44, 54, 70 and everything above.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Investor risk profile, ordered from least to most risk appetite
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    /// Score <= 30
    #[serde(rename = "Conservative")]
    Conservative,
    /// Score <= 44
    #[serde(rename = "Moderately Conservative")]
    ModeratelyConservative,
    /// Score <= 54
    #[serde(rename = "Moderate")]
    Moderate,
    /// Score <= 70
    #[serde(rename = "Moderately Aggressive")]
    ModeratelyAggressive,
    /// Anything above 70
    #[serde(rename = "Aggressive")]
    Aggressive,
}

const CATEGORIES: [RiskProfile; 5] = [
    RiskProfile::Conservative,
    RiskProfile::ModeratelyConservative,
    RiskProfile::Moderate,
    RiskProfile::ModeratelyAggressive,
    RiskProfile::Aggressive,
];

impl RiskProfile {
    /// All categories in ascending order
    pub fn all() -> &'static [RiskProfile] {
        &CATEGORIES
    }

    /// Map a score to its category.
    ///
    /// First category whose upper bound is >= score wins. NaN falls through
    /// every comparison and lands in the last category.
    pub fn from_score(score: f64) -> Self {
        CATEGORIES
            .iter()
            .copied()
            .find(|category| score <= category.upper_bound())
            .unwrap_or(RiskProfile::Aggressive)
    }

    /// Inclusive upper bound of the category
    pub fn upper_bound(&self) -> f64 {
        match self {
            RiskProfile::Conservative => 30.0,
            RiskProfile::ModeratelyConservative => 44.0,
            RiskProfile::Moderate => 54.0,
            RiskProfile::ModeratelyAggressive => 70.0,
            RiskProfile::Aggressive => f64::INFINITY,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::ModeratelyConservative => "Moderately Conservative",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::ModeratelyAggressive => "Moderately Aggressive",
            RiskProfile::Aggressive => "Aggressive",
        }
    }

    /// Long-form description shown to the client
    pub fn description(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => {
                "Conservative Investors want stability and are more concerned with protecting \
                 their current investments than increasing the real value of their investments. \
                 A Conservative Investor is generally seeking to preserve capital and as a \
                 trade-off is usually prepared to accept lower investment terms."
            }
            RiskProfile::ModeratelyConservative => {
                "Moderately Conservative Investors are those who want to protect their capital \
                 and achieve some real increase in the value of their investments. This Investor \
                 is usually seeking a diversified investment portfolio with exposure to a broad \
                 range of investment sectors."
            }
            RiskProfile::Moderate => {
                "Moderate Investors are long-term Investors who want reasonable but relatively \
                 stable growth. Some fluctuations are tolerable, but Moderate Investors want less \
                 risk than that attributable to a fully equity based investment."
            }
            RiskProfile::ModeratelyAggressive => {
                "Moderately Aggressive Investors are long-term Investors who want real growth in \
                 their capital. A fair amount of risk is acceptable."
            }
            RiskProfile::Aggressive => {
                "Aggressive Investors are long-term Investors who want high capital growth. \
                 Substantial year-to-year fluctuations in value are acceptable in exchange for a \
                 potentially high long-term return. An Aggressive Investor is comfortable \
                 accepting high volatility in their capital with the risk of short to \
                 medium-term periods of negative returns. They are willing to trade higher risk \
                 for greater long-term return and have a long investment objective. This \
                 investor is usually seeking a diversified portfolio with exposure to a broad \
                 range of investment sectors."
            }
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for RiskProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CATEGORIES
            .iter()
            .copied()
            .find(|category| category.label() == s)
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_points_are_closed_upper() {
        assert_eq!(RiskProfile::from_score(30.0), RiskProfile::Conservative);
        assert_eq!(RiskProfile::from_score(30.01), RiskProfile::ModeratelyConservative);
        assert_eq!(RiskProfile::from_score(44.0), RiskProfile::ModeratelyConservative);
        assert_eq!(RiskProfile::from_score(44.01), RiskProfile::Moderate);
        assert_eq!(RiskProfile::from_score(54.0), RiskProfile::Moderate);
        assert_eq!(RiskProfile::from_score(54.01), RiskProfile::ModeratelyAggressive);
        assert_eq!(RiskProfile::from_score(70.0), RiskProfile::ModeratelyAggressive);
        assert_eq!(RiskProfile::from_score(70.01), RiskProfile::Aggressive);
    }

    #[test]
    fn test_below_scale_is_conservative() {
        assert_eq!(RiskProfile::from_score(0.0), RiskProfile::Conservative);
        assert_eq!(RiskProfile::from_score(0.5), RiskProfile::Conservative);
    }

    #[test]
    fn test_categories_ascend() {
        let bounds: Vec<f64> = RiskProfile::all().iter().map(|c| c.upper_bound()).collect();
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        assert!(RiskProfile::Conservative < RiskProfile::Aggressive);
    }

    #[test]
    fn test_label_round_trip() {
        for category in RiskProfile::all() {
            assert_eq!(category.label().parse::<RiskProfile>().unwrap(), *category);
            assert!(category.description().starts_with(category.label()));
        }
        assert_eq!(
            "Reckless".parse::<RiskProfile>(),
            Err(Error::UnknownProfile("Reckless".to_string()))
        );
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&RiskProfile::ModeratelyAggressive).unwrap();
        assert_eq!(json, "\"Moderately Aggressive\"");
    }
}
