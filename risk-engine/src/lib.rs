//! Risk Engine for investor risk profiling
//!
//! Deterministic scoring of the risk profile questionnaire

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod profile;
pub mod scoring;
pub mod types;

pub use error::{Error, Result};
pub use profile::RiskProfile;
pub use scoring::{score, RiskScorer};
pub use types::*;
