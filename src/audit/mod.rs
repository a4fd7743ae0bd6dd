pub mod cache;
pub mod client;
pub mod error;
pub mod model;
pub mod normalizer;

pub use cache::{CacheKey, TtlCache, DEFAULT_TTL};
pub use client::{AuditClient, ResultCache};
pub use error::{AuditError, FetchFailure};
pub use model::{
    AuditId, AuditMetric, AuditMetrics, Category, CategoryScore, CategoryScores,
    NormalizedAuditResult, Strategy, NOT_AVAILABLE,
};
pub use normalizer::{normalize, MissingCategory, Normalization};
