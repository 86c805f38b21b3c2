//! Risk scoring engine

use crate::{QuestionnaireAnswers, ScoreBreakdown, ScoreResult};
use tracing::debug;

/// Risk scorer
///
/// Stateless; one instance can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    /// Create new risk scorer
    pub fn new() -> Self {
        Self
    }

    /// Score the questionnaire and derive the risk profile
    pub fn score(&self, answers: &QuestionnaireAnswers) -> ScoreResult {
        let breakdown = self.breakdown(answers);
        let result = ScoreResult::from_total(breakdown.total());

        debug!(
            total_score = result.total_score,
            outcome = result.label(),
            zero_weight_fields = ?breakdown.zero_weight_fields(),
            "Questionnaire scored"
        );

        result
    }

    /// Weight contributed by each field.
    ///
    /// Tags outside a field's set contribute 0.
    pub fn breakdown(&self, answers: &QuestionnaireAnswers) -> ScoreBreakdown {
        ScoreBreakdown {
            investment_term: investment_term_weight(&answers.investment_term),
            required_risk: required_risk_weight(&answers.required_risk),
            risk_tolerance: risk_tolerance_weight(&answers.risk_tolerance),
            risk_capacity: risk_capacity_weight(&answers.risk_capacity),
        }
    }

    /// Total score only
    pub fn total_score(&self, answers: &QuestionnaireAnswers) -> f64 {
        self.breakdown(answers).total()
    }
}

/// Score answers with a default scorer
pub fn score(answers: &QuestionnaireAnswers) -> ScoreResult {
    RiskScorer::new().score(answers)
}

/// Investment term weight: a=2.5, b=10, c=20, d=26.5, e=42.5
pub fn investment_term_weight(tag: &str) -> f64 {
    match tag {
        "a" => 2.5,
        "b" => 10.0,
        "c" => 20.0,
        "d" => 26.5,
        "e" => 42.5,
        _ => 0.0,
    }
}

/// Required risk weight: a=1.25, b=2.5, c=3.75
pub fn required_risk_weight(tag: &str) -> f64 {
    match tag {
        "a" => 1.25,
        "b" => 2.5,
        "c" => 3.75,
        _ => 0.0,
    }
}

/// Risk tolerance weight: a=1.25, b=2.5, c=3.75
pub fn risk_tolerance_weight(tag: &str) -> f64 {
    match tag {
        "a" => 1.25,
        "b" => 2.5,
        "c" => 3.75,
        _ => 0.0,
    }
}

/// Risk capacity weight: a=10, b=20, c=30
pub fn risk_capacity_weight(tag: &str) -> f64 {
    match tag {
        "a" => 10.0,
        "b" => 20.0,
        "c" => 30.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RiskProfile;

    #[test]
    fn test_lowest_answers_are_conservative() {
        let result = score(&QuestionnaireAnswers::new("a", "a", "a", "a"));

        assert_eq!(result.total_score, 15.0);
        assert_eq!(result.outcome, RiskProfile::Conservative);
    }

    #[test]
    fn test_highest_answers_are_aggressive() {
        let result = score(&QuestionnaireAnswers::new("e", "c", "c", "c"));

        assert_eq!(result.total_score, 80.0);
        assert_eq!(result.outcome, RiskProfile::Aggressive);
        assert_eq!(result.label(), "Aggressive");
    }

    #[test]
    fn test_answers_summing_to_boundaries() {
        // 10 + 2.5 + 2.5 + 20 = 35
        let result = score(&QuestionnaireAnswers::new("b", "b", "b", "b"));
        assert_eq!(result.total_score, 35.0);
        assert_eq!(result.outcome, RiskProfile::ModeratelyConservative);

        // 26.5 + 1.25 + 1.25 + 20 = 49
        let result = score(&QuestionnaireAnswers::new("d", "a", "a", "b"));
        assert_eq!(result.total_score, 49.0);
        assert_eq!(result.outcome, RiskProfile::Moderate);

        // 20 + 3.75 + 3.75 + 30 = 57.5
        let result = score(&QuestionnaireAnswers::new("c", "c", "c", "c"));
        assert_eq!(result.total_score, 57.5);
        assert_eq!(result.outcome, RiskProfile::ModeratelyAggressive);
    }

    #[test]
    fn test_answers_summing_exactly_to_cut_points() {
        // 2.5 + 3.75 + 3.75 + 20 = 30
        let result = score(&QuestionnaireAnswers::new("a", "c", "c", "b"));
        assert_eq!(result.total_score, 30.0);
        assert_eq!(result.outcome, RiskProfile::Conservative);

        // 26.5 + 3.75 + 3.75 + 10 = 44
        let result = score(&QuestionnaireAnswers::new("d", "c", "c", "a"));
        assert_eq!(result.total_score, 44.0);
        assert_eq!(result.outcome, RiskProfile::ModeratelyConservative);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let scorer = RiskScorer::new();
        let answers = QuestionnaireAnswers::new("d", "b", "c", "a");

        assert_eq!(scorer.score(&answers), scorer.score(&answers));
    }

    #[test]
    fn test_unknown_tag_scores_zero() {
        let result = score(&QuestionnaireAnswers::new("z", "a", "a", "a"));

        assert_eq!(result.total_score, 1.25 + 1.25 + 10.0);
        assert_eq!(result.outcome, RiskProfile::Conservative);
    }

    #[test]
    fn test_all_unknown_tags_are_below_scale() {
        let result = score(&QuestionnaireAnswers::default());

        assert_eq!(result.total_score, 0.0);
        assert!(result.is_below_scale());
        assert!(score(&QuestionnaireAnswers::new("z", "", "x", "q")).below_scale);
        assert!(!score(&QuestionnaireAnswers::new("a", "a", "a", "a")).is_below_scale());
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(investment_term_weight("A"), 0.0);
        assert_eq!(risk_capacity_weight("C"), 0.0);
    }

    #[test]
    fn test_level_tags_d_and_e_score_zero() {
        assert_eq!(required_risk_weight("d"), 0.0);
        assert_eq!(risk_tolerance_weight("e"), 0.0);
    }

    #[test]
    fn test_breakdown_matches_total() {
        let scorer = RiskScorer::new();
        let answers = QuestionnaireAnswers::new("c", "b", "a", "c");
        let breakdown = scorer.breakdown(&answers);

        assert_eq!(breakdown.investment_term, 20.0);
        assert_eq!(breakdown.required_risk, 2.5);
        assert_eq!(breakdown.risk_tolerance, 1.25);
        assert_eq!(breakdown.risk_capacity, 30.0);
        assert_eq!(scorer.total_score(&answers), 53.75);
    }
}
