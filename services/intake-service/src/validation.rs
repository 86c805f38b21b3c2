//! Form validation run before anything is scored or stored
//!
//! Plain required-text checks are declared on the models with `validator`;
//! dates, the agreement box and signatures are checked here. Failures are
//! reported per field using the form's wire names.

use crate::errors::{IntakeError, IntakeResult, ValidationFailure};
use crate::models::{FaisLetterSubmission, RiskProfileSubmission};
use crate::signature::SignatureImage;
use chrono::NaiveDate;
use risk_engine::QuestionnaireAnswers;
use std::collections::BTreeMap;
use tracing::debug;
use validator::{Validate, ValidationErrors};

pub const PREPARED_ON_REQUIRED: &str =
    "The date field is required, click the calendar icon on the right to select the date";
pub const DATE_REQUIRED: &str =
    "The date field is required, click the calendar icon to select the date";
pub const AGREE_REQUIRED: &str = "You must accept the terms";
pub const SIGNATURE_REQUIRED: &str = "Signature is required";
pub const SIGNATURE_UNREADABLE: &str = "Signature could not be read, please sign again";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Risk profile submission that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRiskProfile {
    pub answers: QuestionnaireAnswers,
    pub prepared_on: NaiveDate,
    pub date: NaiveDate,
    pub signature: SignatureImage,
}

/// FAIS letter that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedFaisLetter {
    pub signatures: Vec<SignatureImage>,
}

/// Per-field failures for one request; first message per field wins
#[derive(Debug, Default)]
struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    fn from_validator(result: Result<(), ValidationErrors>) -> Self {
        let mut collected = Self::default();
        if let Err(errors) = result {
            for (field, field_errors) in errors.field_errors() {
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", to_wire_name(field)));
                collected.add(&to_wire_name(field), &message);
            }
        }
        collected
    }

    fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    fn date(&mut self, field: &str, value: &str, message: &str) -> Option<NaiveDate> {
        match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                self.add(field, message);
                None
            }
        }
    }

    fn signature(&mut self, field: &str, value: &str, required: &str) -> Option<SignatureImage> {
        if value.trim().is_empty() {
            self.add(field, required);
            return None;
        }

        match SignatureImage::from_data_url(value) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("Rejected signature for {}: {}", field, e);
                self.add(field, SIGNATURE_UNREADABLE);
                None
            }
        }
    }

    fn into_result(self) -> IntakeResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }

        Err(IntakeError::Validation(ValidationFailure {
            missing_fields: self.errors.keys().cloned().collect(),
            errors: self.errors,
        }))
    }
}

/// `prepared_for` -> `preparedFor`
pub fn to_wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            name.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            name.push(ch);
        }
    }
    name
}

pub fn validate_risk_profile(
    submission: &RiskProfileSubmission,
    strict_tags: bool,
) -> IntakeResult<ValidatedRiskProfile> {
    let mut errors = FieldErrors::from_validator(submission.validate());

    let prepared_on = errors.date("preparedOn", &submission.prepared_on, PREPARED_ON_REQUIRED);
    let date = errors.date("date", &submission.date, DATE_REQUIRED);

    if !submission.agree {
        errors.add("agree", AGREE_REQUIRED);
    }

    let signature = errors.signature("signature", &submission.signature, SIGNATURE_REQUIRED);

    errors.into_result()?;

    let answers = submission.answers();
    if strict_tags {
        answers.validate_tags()?;
    }

    match (prepared_on, date, signature) {
        (Some(prepared_on), Some(date), Some(signature)) => Ok(ValidatedRiskProfile {
            answers,
            prepared_on,
            date,
            signature,
        }),
        _ => Err(IntakeError::Internal(
            "validated submission is missing parsed fields".to_string(),
        )),
    }
}

pub fn validate_fais_letter(submission: &FaisLetterSubmission) -> IntakeResult<ValidatedFaisLetter> {
    let mut errors = FieldErrors::from_validator(submission.validate());

    let fields = [
        ("signature1", &submission.signature1, "Signature 1 is required"),
        ("signature2", &submission.signature2, "Signature 2 is required"),
        ("signature3", &submission.signature3, "Signature 3 is required"),
    ];

    let signatures: Vec<Option<SignatureImage>> = fields
        .iter()
        .map(|(field, value, required)| errors.signature(field, value, required))
        .collect();

    errors.into_result()?;

    let signatures = signatures.into_iter().flatten().collect::<Vec<_>>();
    if signatures.len() != fields.len() {
        return Err(IntakeError::Internal(
            "validated letter is missing signatures".to_string(),
        ));
    }

    Ok(ValidatedFaisLetter { signatures })
}
