pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod signature;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use errors::{IntakeError, IntakeResult};
pub use storage::{FileSystemSink, MemorySink, SubmissionSink};
