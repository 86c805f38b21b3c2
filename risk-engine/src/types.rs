//! Core types for risk engine

use crate::{Error, Result, RiskProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire name of the investment term field
pub const INVESTMENT_TERM: &str = "investmentTerm";
/// Wire name of the required risk field
pub const REQUIRED_RISK: &str = "requiredRisk";
/// Wire name of the risk tolerance field
pub const RISK_TOLERANCE: &str = "riskTolerance";
/// Wire name of the risk capacity field
pub const RISK_CAPACITY: &str = "riskCapacity";

/// Questionnaire answers as submitted.
///
/// Tags stay raw strings: an unknown tag is not rejected here, it simply
/// scores zero. Use [`QuestionnaireAnswers::validate_tags`] at a boundary
/// that wants to reject them instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswers {
    /// Desired investment term (a-e)
    #[serde(default)]
    pub investment_term: String,

    /// Required risk (a-c)
    #[serde(default)]
    pub required_risk: String,

    /// Risk tolerance (a-c)
    #[serde(default)]
    pub risk_tolerance: String,

    /// Risk capacity (a-c)
    #[serde(default)]
    pub risk_capacity: String,
}

impl QuestionnaireAnswers {
    /// Build answers from four tags
    pub fn new(
        investment_term: impl Into<String>,
        required_risk: impl Into<String>,
        risk_tolerance: impl Into<String>,
        risk_capacity: impl Into<String>,
    ) -> Self {
        Self {
            investment_term: investment_term.into(),
            required_risk: required_risk.into(),
            risk_tolerance: risk_tolerance.into(),
            risk_capacity: risk_capacity.into(),
        }
    }

    /// Check every tag against its enumerated set
    pub fn validate_tags(&self) -> Result<()> {
        InvestmentTerm::parse_field(INVESTMENT_TERM, &self.investment_term)?;
        RiskLevelChoice::parse_field(REQUIRED_RISK, &self.required_risk)?;
        RiskLevelChoice::parse_field(RISK_TOLERANCE, &self.risk_tolerance)?;
        RiskLevelChoice::parse_field(RISK_CAPACITY, &self.risk_capacity)?;
        Ok(())
    }
}

/// Investment term choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentTerm {
    /// 0 - 2 years (tag a)
    ZeroToTwoYears,
    /// 2 - 3 years (tag b)
    TwoToThreeYears,
    /// 3 - 5 years (tag c)
    ThreeToFiveYears,
    /// 5 - 7 years (tag d)
    FiveToSevenYears,
    /// 7 - 10 years (tag e)
    SevenToTenYears,
}

impl InvestmentTerm {
    /// Questionnaire tag
    pub fn tag(&self) -> &'static str {
        match self {
            InvestmentTerm::ZeroToTwoYears => "a",
            InvestmentTerm::TwoToThreeYears => "b",
            InvestmentTerm::ThreeToFiveYears => "c",
            InvestmentTerm::FiveToSevenYears => "d",
            InvestmentTerm::SevenToTenYears => "e",
        }
    }

    fn parse_field(field: &'static str, tag: &str) -> Result<Self> {
        match tag {
            "a" => Ok(InvestmentTerm::ZeroToTwoYears),
            "b" => Ok(InvestmentTerm::TwoToThreeYears),
            "c" => Ok(InvestmentTerm::ThreeToFiveYears),
            "d" => Ok(InvestmentTerm::FiveToSevenYears),
            "e" => Ok(InvestmentTerm::SevenToTenYears),
            _ => Err(Error::InvalidCategoryTag {
                field,
                tag: tag.to_string(),
            }),
        }
    }
}

impl FromStr for InvestmentTerm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_field(INVESTMENT_TERM, s)
    }
}

impl fmt::Display for InvestmentTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvestmentTerm::ZeroToTwoYears => "0 - 2 years",
            InvestmentTerm::TwoToThreeYears => "2 - 3 years",
            InvestmentTerm::ThreeToFiveYears => "3 - 5 years",
            InvestmentTerm::FiveToSevenYears => "5 - 7 years",
            InvestmentTerm::SevenToTenYears => "7 - 10 years",
        };
        write!(f, "{}", label)
    }
}

/// Three-level choice shared by required risk, risk tolerance and risk capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevelChoice {
    /// Tag a
    Low,
    /// Tag b
    Moderate,
    /// Tag c
    High,
}

impl RiskLevelChoice {
    /// Questionnaire tag
    pub fn tag(&self) -> &'static str {
        match self {
            RiskLevelChoice::Low => "a",
            RiskLevelChoice::Moderate => "b",
            RiskLevelChoice::High => "c",
        }
    }

    /// Parse a tag, naming the field in the error
    pub fn parse_field(field: &'static str, tag: &str) -> Result<Self> {
        match tag {
            "a" => Ok(RiskLevelChoice::Low),
            "b" => Ok(RiskLevelChoice::Moderate),
            "c" => Ok(RiskLevelChoice::High),
            _ => Err(Error::InvalidCategoryTag {
                field,
                tag: tag.to_string(),
            }),
        }
    }
}

/// Per-field contribution to the total score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Investment term weight
    pub investment_term: f64,
    /// Required risk weight
    pub required_risk: f64,
    /// Risk tolerance weight
    pub risk_tolerance: f64,
    /// Risk capacity weight
    pub risk_capacity: f64,
}

impl ScoreBreakdown {
    /// Sum of the four contributions
    pub fn total(&self) -> f64 {
        self.investment_term + self.required_risk + self.risk_tolerance + self.risk_capacity
    }

    /// Fields whose tag fell through to the zero weight
    pub fn zero_weight_fields(&self) -> Vec<&'static str> {
        [
            (INVESTMENT_TERM, self.investment_term),
            (REQUIRED_RISK, self.required_risk),
            (RISK_TOLERANCE, self.risk_tolerance),
            (RISK_CAPACITY, self.risk_capacity),
        ]
        .into_iter()
        .filter(|(_, weight)| *weight == 0.0)
        .map(|(field, _)| field)
        .collect()
    }
}

/// Score and derived profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Sum of the looked-up weights
    pub total_score: f64,

    /// Risk profile derived from the score
    #[serde(rename = "scoreOutcome")]
    pub outcome: RiskProfile,

    /// Score fell below 1, the lowest total valid answers can reach.
    /// The outcome is then Conservative only by position on the ladder.
    pub below_scale: bool,
}

impl ScoreResult {
    /// Build a result from a total score
    pub fn from_total(total_score: f64) -> Self {
        Self {
            total_score,
            outcome: RiskProfile::from_score(total_score),
            below_scale: total_score < 1.0,
        }
    }

    /// Outcome label, e.g. "Moderately Conservative"
    pub fn label(&self) -> &'static str {
        self.outcome.label()
    }

    /// Long-form description of the outcome
    pub fn description(&self) -> &'static str {
        self.outcome.description()
    }

    /// Score below 1, only reachable when some tags scored zero
    pub fn is_below_scale(&self) -> bool {
        self.below_scale
    }
}
