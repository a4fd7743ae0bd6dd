pub mod aggregator;
pub mod exporter;

pub use aggregator::{AbortHandle, Aggregator, AnalysisRecord, Batch, BatchOutcome, UrlFailure};
pub use exporter::{export, export_with_sheet, Artifact, ExportError, ExportFormat, ScoreCell};
