pub mod audit;
pub mod config;
pub mod input;
pub mod report;
pub mod utils;
pub mod validator;

pub use audit::{AuditClient, AuditError, NormalizedAuditResult, Strategy};
pub use config::AuditConfig;
pub use report::{export, Aggregator, AnalysisRecord, Artifact, Batch, ExportFormat};
pub use validator::validate;
