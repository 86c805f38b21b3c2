//! Signature images captured as data URLs
//!
//! The signature pad posts `data:image/png;base64,<payload>`. The decoded
//! bytes are opaque to the service and stored exactly as received.

use crate::errors::{IntakeError, IntakeResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SignatureImage {
    pub fn from_data_url(data_url: &str) -> IntakeResult<Self> {
        let rest = data_url.trim().strip_prefix(DATA_URL_PREFIX).ok_or_else(|| {
            IntakeError::InvalidSignature("expected a data URL".to_string())
        })?;

        let (mime_type, payload) = rest.split_once(BASE64_MARKER).ok_or_else(|| {
            IntakeError::InvalidSignature("data URL is not base64 encoded".to_string())
        })?;

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| IntakeError::InvalidSignature(format!("bad base64 payload: {}", e)))?;

        if bytes.is_empty() {
            return Err(IntakeError::InvalidSignature("image is empty".to_string()));
        }

        Ok(Self {
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type.to_string()
            },
            bytes,
        })
    }

    /// File extension used when the image is written out
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/svg+xml" => "svg",
            "image/webp" => "webp",
            _ => "bin",
        }
    }

    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
