use crate::errors::{IntakeError, IntakeResult, ValidationFailure};
use crate::metrics;
use crate::models::*;
use crate::signature::SignatureImage;
use crate::storage::{Attachment, SubmissionEnvelope, SubmissionSink};
use crate::validation;
use actix_multipart::{Field, Multipart};
use actix_web::{guard, http::header, web, HttpRequest, HttpResponse};
use chrono::Utc;
use futures_util::StreamExt;
use risk_engine::{QuestionnaireAnswers, RiskProfile, RiskScorer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

const FILE_REQUIRED: &str = "File is required";
const UPLOAD_FIELD: &str = "file";
const DEFAULT_UPLOAD_LIMIT: usize = 4 * 1024 * 1024;

/// Per-process settings shared by all handlers
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub strict_tags: bool,
    pub started_at: Instant,
    /// Byte cap on a multipart upload body
    pub upload_limit: usize,
}

impl ServiceState {
    pub fn new(strict_tags: bool) -> Self {
        Self {
            strict_tags,
            started_at: Instant::now(),
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        }
    }

    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.upload_limit = limit;
        self
    }
}

/// JSON extractor settings; malformed bodies get the service's error shape
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req: &HttpRequest| {
            IntakeError::MalformedRequest(err.to_string()).into()
        })
}

/// Same number formatting the questionnaire has always reported: 15, 57.5, 53.75
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}

fn rejected<T>(form: SubmissionKind, err: IntakeError) -> IntakeResult<T> {
    metrics::record_submission(form.as_str(), "rejected");
    Err(err)
}

// ===== Health Check =====
pub async fn health_check(
    sink: web::Data<Arc<dyn SubmissionSink>>,
    state: web::Data<ServiceState>,
) -> HttpResponse {
    let status = match sink.health_check().await {
        Ok(()) => "healthy",
        Err(e) => {
            warn!("Submission sink health check failed: {}", e);
            "degraded"
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        storage: sink.name().to_string(),
    })
}

// ===== Risk Categories =====
pub async fn list_categories() -> HttpResponse {
    let categories: Vec<RiskCategoryResponse> = RiskProfile::all()
        .iter()
        .copied()
        .map(RiskCategoryResponse::from)
        .collect();

    HttpResponse::Ok().json(categories)
}

// ===== Score Only =====
pub async fn score_answers(
    req: web::Json<QuestionnaireAnswers>,
    scorer: web::Data<Arc<RiskScorer>>,
    state: web::Data<ServiceState>,
) -> Result<HttpResponse, IntakeError> {
    let answers = req.into_inner();
    if state.strict_tags {
        answers.validate_tags()?;
    }

    let breakdown = scorer.breakdown(&answers);
    let result = scorer.score(&answers);

    Ok(HttpResponse::Ok().json(ScoreResponse {
        total_score: result.total_score,
        score_outcome: result.outcome,
        profile_description: result.description().to_string(),
        below_scale: result.below_scale,
        breakdown,
    }))
}

// ===== Risk Profile Submission =====
pub async fn submit_risk_profile(
    req: web::Json<RiskProfileSubmission>,
    scorer: web::Data<Arc<RiskScorer>>,
    sink: web::Data<Arc<dyn SubmissionSink>>,
    state: web::Data<ServiceState>,
) -> Result<HttpResponse, IntakeError> {
    let form = SubmissionKind::RiskProfile;
    let submission = req.into_inner();

    let validated = match validation::validate_risk_profile(&submission, state.strict_tags) {
        Ok(v) => v,
        Err(e) => return rejected(form, e),
    };

    let result = scorer.score(&validated.answers);
    if result.is_below_scale() {
        warn!(
            "Score {} is below the questionnaire scale; unknown answer tags scored zero",
            result.total_score
        );
    }

    let id = Uuid::new_v4();
    let signature_file = validated.signature.file_name("signature");
    let record = RiskProfileRecord {
        id,
        prepared_for: submission.prepared_for,
        identity_number: submission.identity_number,
        prepared_by: submission.prepared_by,
        prepared_on: validated.prepared_on,
        date: validated.date,
        answers: validated.answers,
        total_score: format_score(result.total_score),
        score_outcome: result.outcome,
        profile_description: result.description().to_string(),
        below_scale: result.below_scale,
        agree: submission.agree,
        signature_file: signature_file.clone(),
        submitted_at: Utc::now(),
    };

    let signature_bytes = validated.signature.len();
    let envelope = SubmissionEnvelope::new(
        id,
        form,
        &record,
        vec![Attachment {
            file_name: signature_file,
            image: validated.signature,
        }],
    )?;

    let stored = match sink.store(&envelope).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!("Failed to store risk profile {}: {}", id, e);
            metrics::record_submission(form.as_str(), "failed");
            return Err(e);
        }
    };

    metrics::record_submission(form.as_str(), "accepted");
    metrics::record_score(result.total_score, result.label());
    metrics::SIGNATURE_BYTES.observe(signature_bytes as f64);

    info!(
        "Risk profile {} scored {} ({}) stored at {}",
        id, record.total_score, result.outcome, stored.location
    );

    Ok(HttpResponse::Ok().json(RiskProfileResponse {
        success: true,
        id,
        total_score: record.total_score,
        score_outcome: record.score_outcome,
        profile_description: record.profile_description,
        below_scale: record.below_scale,
        missing_fields: Vec::new(),
    }))
}

// ===== FAIS Letter Submission =====
pub async fn submit_fais_letter(
    req: web::Json<FaisLetterSubmission>,
    sink: web::Data<Arc<dyn SubmissionSink>>,
) -> Result<HttpResponse, IntakeError> {
    let form = SubmissionKind::FaisLetter;
    let submission = req.into_inner();

    let validated = match validation::validate_fais_letter(&submission) {
        Ok(v) => v,
        Err(e) => return rejected(form, e),
    };

    let id = Uuid::new_v4();
    let attachments: Vec<Attachment> = validated
        .signatures
        .into_iter()
        .enumerate()
        .map(|(i, image)| Attachment {
            file_name: image.file_name(&format!("signature{}", i + 1)),
            image,
        })
        .collect();

    let record = FaisLetterRecord {
        id,
        full_name: submission.full_name,
        id_number: submission.id_number,
        signature_files: attachments.iter().map(|a| a.file_name.clone()).collect(),
        submitted_at: Utc::now(),
    };

    for attachment in &attachments {
        metrics::SIGNATURE_BYTES.observe(attachment.image.len() as f64);
    }

    let envelope = SubmissionEnvelope::new(id, form, &record, attachments)?;
    let stored = match sink.store(&envelope).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!("Failed to store FAIS letter {}: {}", id, e);
            metrics::record_submission(form.as_str(), "failed");
            return Err(e);
        }
    };

    metrics::record_submission(form.as_str(), "accepted");
    info!("FAIS letter {} stored at {}", id, stored.location);

    Ok(HttpResponse::Ok().json(FaisLetterResponse {
        success: true,
        id,
        missing_fields: Vec::new(),
    }))
}

// ===== Generic File Upload =====
pub async fn upload_file(
    req: web::Json<UploadRequest>,
    sink: web::Data<Arc<dyn SubmissionSink>>,
) -> Result<HttpResponse, IntakeError> {
    let form = SubmissionKind::Upload;
    let request = req.into_inner();

    let data_url = match request.file.as_deref().map(str::trim) {
        Some(file) if !file.is_empty() => file,
        _ => {
            return rejected(
                form,
                IntakeError::Validation(ValidationFailure::single(UPLOAD_FIELD, FILE_REQUIRED)),
            )
        }
    };

    let image = match SignatureImage::from_data_url(data_url) {
        Ok(image) => image,
        Err(e) => return rejected(form, e),
    };

    store_upload(request.fields, image, None, sink.get_ref().as_ref()).await
}

// ===== Multipart File Upload =====
pub async fn upload_multipart(
    payload: Multipart,
    sink: web::Data<Arc<dyn SubmissionSink>>,
    state: web::Data<ServiceState>,
) -> Result<HttpResponse, IntakeError> {
    let form = SubmissionKind::Upload;

    let (fields, upload) = match read_multipart(payload, state.upload_limit).await {
        Ok(parts) => parts,
        Err(e) => return rejected(form, e),
    };

    let Some((image, original_name)) = upload else {
        return rejected(
            form,
            IntakeError::Validation(ValidationFailure::single(UPLOAD_FIELD, FILE_REQUIRED)),
        );
    };

    store_upload(fields, image, original_name, sink.get_ref().as_ref()).await
}

type MultipartParts = (
    BTreeMap<String, serde_json::Value>,
    Option<(SignatureImage, Option<String>)>,
);

/// Text parts become fields; the `file` part becomes the upload
async fn read_multipart(mut payload: Multipart, limit: usize) -> IntakeResult<MultipartParts> {
    let mut fields = BTreeMap::new();
    let mut upload = None;
    let mut total = 0usize;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| IntakeError::MalformedRequest(e.to_string()))?;
        let name = field.name().to_string();
        let original_name = field
            .content_disposition()
            .get_filename()
            .map(str::to_string);
        let mime_type = field
            .content_type()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = read_field(&mut field, limit, &mut total).await?;

        if name == UPLOAD_FIELD {
            if !bytes.is_empty() {
                upload = Some((SignatureImage { mime_type, bytes }, original_name));
            }
        } else {
            let value = String::from_utf8_lossy(&bytes).into_owned();
            fields.insert(name, serde_json::Value::String(value));
        }
    }

    Ok((fields, upload))
}

async fn read_field(field: &mut Field, limit: usize, total: &mut usize) -> IntakeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| IntakeError::MalformedRequest(e.to_string()))?;
        *total += chunk.len();
        if *total > limit {
            return Err(IntakeError::MalformedRequest(format!(
                "upload exceeds {} bytes",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Stored name keeps the client's extension when it is a plain one
fn upload_file_name(image: &SignatureImage, original_name: Option<&str>) -> String {
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{}", UPLOAD_FIELD, ext),
        _ => image.file_name(UPLOAD_FIELD),
    }
}

async fn store_upload(
    fields: BTreeMap<String, serde_json::Value>,
    image: SignatureImage,
    original_name: Option<String>,
    sink: &dyn SubmissionSink,
) -> Result<HttpResponse, IntakeError> {
    let form = SubmissionKind::Upload;
    let id = Uuid::new_v4();
    let file_name = upload_file_name(&image, original_name.as_deref());
    let record = UploadRecord {
        id,
        fields: fields.clone(),
        file_name: file_name.clone(),
        original_name,
        content_type: image.mime_type.clone(),
        size_bytes: image.len(),
        submitted_at: Utc::now(),
    };

    let envelope = SubmissionEnvelope::new(
        id,
        form,
        &record,
        vec![Attachment {
            file_name: file_name.clone(),
            image,
        }],
    )?;

    if let Err(e) = sink.store(&envelope).await {
        warn!("Failed to store upload {}: {}", id, e);
        metrics::record_submission(form.as_str(), "failed");
        return Err(e);
    }

    metrics::record_submission(form.as_str(), "accepted");
    info!("Upload {} stored as {}", id, file_name);

    Ok(HttpResponse::Ok().json(UploadResponse {
        success: true,
        id,
        fields,
        files: vec![file_name],
    }))
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("multipart/form-data"))
}

// ===== Prometheus Metrics =====
pub async fn get_metrics() -> Result<HttpResponse, IntakeError> {
    let body = metrics::metrics_handler().map_err(|e| IntakeError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/risk-profile", web::post().to(submit_risk_profile))
            .route("/risk-profile/score", web::post().to(score_answers))
            .route("/risk-profile/categories", web::get().to(list_categories))
            .route("/fais-letter", web::post().to(submit_fais_letter)),
    )
    .service(
        web::resource("/api/upload")
            .route(
                web::post()
                    .guard(guard::fn_guard(is_multipart))
                    .to(upload_multipart),
            )
            .route(web::post().to(upload_file)),
    )
    .route("/health", web::get().to(health_check))
    .route("/metrics", web::get().to(get_metrics));
}
