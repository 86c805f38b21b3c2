use chrono::{DateTime, NaiveDate, Utc};
use risk_engine::{QuestionnaireAnswers, RiskProfile, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// ===== Risk Profile Questionnaire =====
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskProfileSubmission {
    #[validate(length(min = 1, message = "The prepared for field is required"))]
    pub prepared_for: String,

    #[validate(length(min = 1, message = "Your identity number is required"))]
    pub identity_number: String,

    #[validate(length(min = 1, message = "The prepared by field is required"))]
    pub prepared_by: String,

    pub prepared_on: String,

    #[validate(length(min = 1, message = "Your desired investment term is required"))]
    pub investment_term: String,

    #[validate(length(min = 1, message = "Your required risk is required"))]
    pub required_risk: String,

    #[validate(length(min = 1, message = "Your risk tolerance is required"))]
    pub risk_tolerance: String,

    #[validate(length(min = 1, message = "Your risk capacity is required"))]
    pub risk_capacity: String,

    pub agree: bool,

    /// PNG data URL from the signature pad
    pub signature: String,

    pub date: String,
}

impl RiskProfileSubmission {
    /// Snapshot of the four answers, taken once per request
    pub fn answers(&self) -> QuestionnaireAnswers {
        QuestionnaireAnswers::new(
            self.investment_term.clone(),
            self.required_risk.clone(),
            self.risk_tolerance.clone(),
            self.risk_capacity.clone(),
        )
    }
}

/// Combined record handed to the submission sink
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfileRecord {
    pub id: Uuid,
    pub prepared_for: String,
    pub identity_number: String,
    pub prepared_by: String,
    pub prepared_on: NaiveDate,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub answers: QuestionnaireAnswers,
    /// Stringified the way the questionnaire always reported it ("57.5")
    pub total_score: String,
    pub score_outcome: RiskProfile,
    pub profile_description: String,
    /// Set when unknown tags pushed the score under the questionnaire's range
    pub below_scale: bool,
    pub agree: bool,
    pub signature_file: String,
    pub submitted_at: DateTime<Utc>,
}

// ===== FAIS Letter =====
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct FaisLetterSubmission {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(min = 1, message = "ID number is required"))]
    pub id_number: String,

    pub signature1: String,

    pub signature2: String,

    pub signature3: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaisLetterRecord {
    pub id: Uuid,
    pub full_name: String,
    pub id_number: String,
    pub signature_files: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

// ===== Generic Upload =====
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub file: Option<String>,

    /// Everything else passes through untouched
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: Uuid,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub file_name: String,
    /// Client-side file name from a multipart upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub content_type: String,
    pub size_bytes: usize,
    pub submitted_at: DateTime<Utc>,
}

// ===== Submission Kinds =====
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionKind {
    RiskProfile,
    FaisLetter,
    Upload,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::RiskProfile => "risk-profile",
            SubmissionKind::FaisLetter => "fais-letter",
            SubmissionKind::Upload => "upload",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a submission ended up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub location: String,
}

// ===== API Responses =====
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub total_score: f64,
    pub score_outcome: RiskProfile,
    pub profile_description: String,
    pub below_scale: bool,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfileResponse {
    pub success: bool,
    pub id: Uuid,
    pub total_score: String,
    pub score_outcome: RiskProfile,
    pub profile_description: String,
    pub below_scale: bool,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaisLetterResponse {
    pub success: bool,
    pub id: Uuid,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub id: Uuid,
    pub fields: BTreeMap<String, serde_json::Value>,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCategoryResponse {
    pub label: String,
    /// None for the open-ended top category
    pub upper_bound: Option<f64>,
    pub description: String,
}

impl From<RiskProfile> for RiskCategoryResponse {
    fn from(profile: RiskProfile) -> Self {
        let upper_bound = profile.upper_bound();
        RiskCategoryResponse {
            label: profile.label().to_string(),
            upper_bound: upper_bound.is_finite().then_some(upper_bound),
            description: profile.description().to_string(),
        }
    }
}

// ===== Health Check =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: String,
}

// ===== Error Response =====
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_reads_camel_case() {
        let submission: RiskProfileSubmission = serde_json::from_value(serde_json::json!({
            "preparedFor": "Thandi Mokoena",
            "identityNumber": "8001015009087",
            "investmentTerm": "c",
            "agree": true
        }))
        .unwrap();

        assert_eq!(submission.prepared_for, "Thandi Mokoena");
        assert!(submission.agree);
        assert!(submission.signature.is_empty());
        assert_eq!(submission.answers().investment_term, "c");
    }

    #[test]
    fn test_upload_request_keeps_extra_fields() {
        let request: UploadRequest = serde_json::from_value(serde_json::json!({
            "name": "statement",
            "pages": 3
        }))
        .unwrap();

        assert!(request.file.is_none());
        assert_eq!(request.fields.len(), 2);
        assert_eq!(request.fields["name"], "statement");
    }

    #[test]
    fn test_category_response_open_top() {
        let top = RiskCategoryResponse::from(RiskProfile::Aggressive);
        assert_eq!(top.upper_bound, None);

        let bottom = RiskCategoryResponse::from(RiskProfile::Conservative);
        assert_eq!(bottom.upper_bound, Some(30.0));
    }

    #[test]
    fn test_record_flattens_answers() {
        let record = RiskProfileRecord {
            id: Uuid::new_v4(),
            prepared_for: "A".to_string(),
            identity_number: "1".to_string(),
            prepared_by: "B".to_string(),
            prepared_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            answers: QuestionnaireAnswers::new("a", "a", "a", "a"),
            total_score: "15".to_string(),
            score_outcome: RiskProfile::Conservative,
            profile_description: RiskProfile::Conservative.description().to_string(),
            below_scale: false,
            agree: true,
            signature_file: "signature.png".to_string(),
            submitted_at: Utc::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["investmentTerm"], "a");
        assert_eq!(json["scoreOutcome"], "Conservative");
        assert_eq!(json["preparedOn"], "2024-05-01");
        assert_eq!(json["belowScale"], false);
    }
}
