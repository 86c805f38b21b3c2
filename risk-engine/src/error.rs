//! Error types for risk engine

use thiserror::Error;

/// Risk engine error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Answer tag outside the field's enumerated set
    #[error("Invalid category tag '{tag}' for field {field}")]
    InvalidCategoryTag {
        /// Wire name of the questionnaire field
        field: &'static str,
        /// Tag as submitted
        tag: String,
    },

    /// Label that names none of the risk profiles
    #[error("Unknown risk profile '{0}'")]
    UnknownProfile(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
