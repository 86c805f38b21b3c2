//! Submission sinks
//!
//! A sink receives one complete submission at a time: the JSON record plus
//! its images. A submission is either stored whole or not at all.

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{IntakeError, IntakeResult};
use crate::models::{StoredSubmission, SubmissionKind};
use crate::signature::SignatureImage;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

const RECORD_FILE: &str = "record.json";
const WRITE_CHECK_FILE: &str = ".write-check";

/// Image stored next to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub image: SignatureImage,
}

/// Everything that crosses into the sink for one submission
#[derive(Debug, Clone)]
pub struct SubmissionEnvelope {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub record: serde_json::Value,
    pub attachments: Vec<Attachment>,
}

impl SubmissionEnvelope {
    pub fn new<T: Serialize>(
        id: Uuid,
        kind: SubmissionKind,
        record: &T,
        attachments: Vec<Attachment>,
    ) -> IntakeResult<Self> {
        Ok(Self {
            id,
            kind,
            record: serde_json::to_value(record)?,
            attachments,
        })
    }
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Store a submission atomically
    async fn store(&self, envelope: &SubmissionEnvelope) -> IntakeResult<StoredSubmission>;

    /// Check that the sink can accept writes
    async fn health_check(&self) -> IntakeResult<()>;

    fn name(&self) -> &'static str;
}

pub fn create_sink(config: &StorageConfig) -> Arc<dyn SubmissionSink> {
    match config.backend {
        StorageBackend::Filesystem => Arc::new(FileSystemSink::new(config.upload_dir.clone())),
        StorageBackend::Memory => {
            warn!("Using in-memory submission sink - submissions are not persisted");
            Arc::new(MemorySink::new())
        }
    }
}

/// Writes `<root>/<kind>/<id>/record.json` and the attachments beside it
pub struct FileSystemSink {
    root: PathBuf,
}

impl FileSystemSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn submission_dir(&self, kind: SubmissionKind, id: Uuid) -> PathBuf {
        self.root.join(kind.as_str()).join(id.to_string())
    }

    async fn write_all(&self, dir: &Path, envelope: &SubmissionEnvelope) -> IntakeResult<()> {
        fs::create_dir_all(dir).await?;

        let record = serde_json::to_vec_pretty(&envelope.record)?;
        fs::write(dir.join(RECORD_FILE), record).await?;

        for attachment in &envelope.attachments {
            if !is_plain_file_name(&attachment.file_name) {
                return Err(IntakeError::Storage(format!(
                    "refusing attachment name {:?}",
                    attachment.file_name
                )));
            }
            fs::write(dir.join(&attachment.file_name), &attachment.image.bytes).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl SubmissionSink for FileSystemSink {
    async fn store(&self, envelope: &SubmissionEnvelope) -> IntakeResult<StoredSubmission> {
        let final_dir = self.submission_dir(envelope.kind, envelope.id);
        if fs::try_exists(&final_dir).await? {
            return Err(IntakeError::Storage(format!(
                "submission {} already exists",
                envelope.id
            )));
        }

        // Stage in a sibling directory so readers never see a partial submission
        let staging_dir = self
            .root
            .join(envelope.kind.as_str())
            .join(format!(".staging-{}", envelope.id));

        if let Err(e) = self.write_all(&staging_dir, envelope).await {
            discard_staging(&staging_dir).await;
            return Err(e);
        }
        commit_staging(&staging_dir, &final_dir).await?;

        info!(
            "Stored {} submission {} with {} attachment(s)",
            envelope.kind,
            envelope.id,
            envelope.attachments.len()
        );

        Ok(StoredSubmission {
            id: envelope.id,
            kind: envelope.kind,
            location: final_dir.display().to_string(),
        })
    }

    async fn health_check(&self) -> IntakeResult<()> {
        fs::create_dir_all(&self.root).await?;

        let check = self.root.join(WRITE_CHECK_FILE);
        if let Err(e) = fs::write(&check, b"ok").await {
            return Err(IntakeError::Storage(format!(
                "{} is not writable: {}",
                self.root.display(),
                e
            )));
        }
        fs::remove_file(&check).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

/// Move a staged submission into place, discarding it if the move fails
async fn commit_staging(staging_dir: &Path, final_dir: &Path) -> IntakeResult<()> {
    if let Err(e) = fs::rename(staging_dir, final_dir).await {
        discard_staging(staging_dir).await;
        return Err(e.into());
    }
    Ok(())
}

async fn discard_staging(staging_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(staging_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to clean up {}: {}", staging_dir.display(), e);
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != RECORD_FILE
        && !name.contains(['/', '\\'])
}

/// Keeps submissions in memory; for tests and dry runs
#[derive(Default)]
pub struct MemorySink {
    submissions: RwLock<Vec<SubmissionEnvelope>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<SubmissionEnvelope> {
        self.submissions.read().clone()
    }

    pub fn len(&self) -> usize {
        self.submissions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.read().is_empty()
    }
}

#[async_trait]
impl SubmissionSink for MemorySink {
    async fn store(&self, envelope: &SubmissionEnvelope) -> IntakeResult<StoredSubmission> {
        let mut submissions = self.submissions.write();
        if submissions.iter().any(|s| s.id == envelope.id) {
            return Err(IntakeError::Storage(format!(
                "submission {} already exists",
                envelope.id
            )));
        }
        submissions.push(envelope.clone());

        Ok(StoredSubmission {
            id: envelope.id,
            kind: envelope.kind,
            location: format!("memory://{}/{}", envelope.kind, envelope.id),
        })
    }

    async fn health_check(&self) -> IntakeResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::tests::PNG_DATA_URL;
    use serde_json::json;

    fn envelope(kind: SubmissionKind) -> SubmissionEnvelope {
        let image = SignatureImage::from_data_url(PNG_DATA_URL).unwrap();
        SubmissionEnvelope::new(
            Uuid::new_v4(),
            kind,
            &json!({ "fullName": "Sipho Dlamini" }),
            vec![Attachment {
                file_name: image.file_name("signature1"),
                image,
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_filesystem_sink_writes_record_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSystemSink::new(dir.path());
        let envelope = envelope(SubmissionKind::FaisLetter);

        let stored = sink.store(&envelope).await.unwrap();

        let submission_dir = dir
            .path()
            .join("fais-letter")
            .join(envelope.id.to_string());
        assert_eq!(stored.location, submission_dir.display().to_string());

        let record: serde_json::Value =
            serde_json::from_slice(&std::fs::read(submission_dir.join(RECORD_FILE)).unwrap())
                .unwrap();
        assert_eq!(record["fullName"], "Sipho Dlamini");

        let png = std::fs::read(submission_dir.join("signature1.png")).unwrap();
        assert_eq!(png, envelope.attachments[0].image.bytes);

        let staging = dir
            .path()
            .join("fais-letter")
            .join(format!(".staging-{}", envelope.id));
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_filesystem_sink_rejects_duplicate_id() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSystemSink::new(dir.path());
        let envelope = envelope(SubmissionKind::RiskProfile);

        sink.store(&envelope).await.unwrap();
        assert!(matches!(
            sink.store(&envelope).await,
            Err(IntakeError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_filesystem_sink_rejects_path_in_attachment_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSystemSink::new(dir.path());
        let mut envelope = envelope(SubmissionKind::Upload);
        envelope.attachments[0].file_name = "../escape.png".to_string();

        assert!(sink.store(&envelope).await.is_err());

        let kind_dir = dir.path().join("upload");
        assert_eq!(std::fs::read_dir(kind_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_filesystem_health_check_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        let sink = FileSystemSink::new(&root);

        sink.health_check().await.unwrap();
        assert!(root.is_dir());
        assert!(!root.join(WRITE_CHECK_FILE).exists());
    }

    #[tokio::test]
    async fn test_filesystem_health_check_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::write(&root, b"not a directory").unwrap();
        let sink = FileSystemSink::new(&root);

        assert!(sink.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_commit_removes_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSystemSink::new(dir.path());
        let envelope = envelope(SubmissionKind::RiskProfile);

        let kind_dir = dir.path().join("risk-profile");
        let staging = kind_dir.join(format!(".staging-{}", envelope.id));
        let final_dir = kind_dir.join(envelope.id.to_string());
        // Renaming onto a non-empty directory fails
        std::fs::create_dir_all(final_dir.join("occupied")).unwrap();

        sink.write_all(&staging, &envelope).await.unwrap();
        assert!(commit_staging(&staging, &final_dir).await.is_err());

        assert!(!staging.exists());
        assert!(final_dir.join("occupied").is_dir());
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemorySink::new();
        let envelope = envelope(SubmissionKind::Upload);

        let stored = sink.store(&envelope).await.unwrap();

        assert_eq!(stored.kind, SubmissionKind::Upload);
        assert!(stored.location.starts_with("memory://upload/"));
        assert_eq!(sink.len(), 1);
        assert!(sink.store(&envelope).await.is_err());
    }

    #[test]
    fn test_create_sink_by_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            upload_dir: PathBuf::from("unused"),
        };
        assert_eq!(create_sink(&config).name(), "memory");
    }
}
