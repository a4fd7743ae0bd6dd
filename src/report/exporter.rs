use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use super::aggregator::{AnalysisRecord, Batch};
use crate::audit::{Category, NormalizedAuditResult, Strategy, NOT_AVAILABLE};

/// Default worksheet name for spreadsheet exports
pub const DEFAULT_SHEET_NAME: &str = "Analysis Results";

/// Base name of exported files
pub const FILE_STEM: &str = "seo_audit_results";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build spreadsheet: {0}")]
    Spreadsheet(#[from] XlsxError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn default_file_name(&self) -> String {
        format!("{}.{}", FILE_STEM, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Excel => f.write_str("excel"),
        }
    }
}

/// Exported data, text for JSON/CSV and binary for spreadsheets
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Text { format: ExportFormat, content: String },
    Binary { format: ExportFormat, content: Vec<u8> },
}

impl Artifact {
    pub fn format(&self) -> ExportFormat {
        match self {
            Artifact::Text { format, .. } | Artifact::Binary { format, .. } => *format,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Artifact::Text { content, .. } => content.as_bytes(),
            Artifact::Binary { content, .. } => content,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text { content, .. } => Some(content),
            Artifact::Binary { .. } => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format().mime_type()
    }

    pub fn default_file_name(&self) -> String {
        self.format().default_file_name()
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, self.as_bytes())?;
        info!("Wrote {} export to {}", self.format(), path.display());
        Ok(())
    }
}

/// A flattened score as shown in tabular exports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreCell {
    Value(f64),
    NotAvailable,
}

impl ScoreCell {
    /// `score * 100` for positive scores, `0` otherwise, `N/A` when unreadable
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            ScoreCell::NotAvailable
        } else if score > 0.0 {
            // rounded to two decimals: 0.29 * 100 is 28.999999999999996
            ScoreCell::Value((score * 100.0 * 100.0).round() / 100.0)
        } else {
            ScoreCell::Value(0.0)
        }
    }
}

impl fmt::Display for ScoreCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreCell::Value(v) => write!(f, "{}", v),
            ScoreCell::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Tabular column headers, URL first then desktop and mobile categories
pub fn column_headers() -> Vec<String> {
    let mut headers = vec!["URL".to_string()];
    for strategy in Strategy::ALL {
        let prefix = match strategy {
            Strategy::Desktop => "Desktop",
            Strategy::Mobile => "Mobile",
        };
        headers.extend(
            Category::ALL
                .iter()
                .map(|category| format!("{} {}", prefix, category.label())),
        );
    }
    headers
}

/// One tabular row per record
pub fn flatten(record: &AnalysisRecord) -> (String, Vec<ScoreCell>) {
    let cells = Strategy::ALL
        .iter()
        .flat_map(|strategy| {
            let result: &NormalizedAuditResult = match strategy {
                Strategy::Desktop => &record.desktop,
                Strategy::Mobile => &record.mobile,
            };
            Category::ALL
                .iter()
                .map(move |category| ScoreCell::from_score(result.category_score(*category)))
        })
        .collect();
    (record.url.clone(), cells)
}

/// Serializes `batch` as `format`, using the default sheet name for spreadsheets
pub fn export(batch: &Batch, format: ExportFormat) -> Result<Artifact, ExportError> {
    export_with_sheet(batch, format, DEFAULT_SHEET_NAME)
}

pub fn export_with_sheet(
    batch: &Batch,
    format: ExportFormat,
    sheet_name: &str,
) -> Result<Artifact, ExportError> {
    debug!("Exporting {} record(s) as {}", batch.len(), format);
    match format {
        ExportFormat::Json => Ok(Artifact::Text {
            format,
            content: to_json(batch)?,
        }),
        ExportFormat::Csv => Ok(Artifact::Text {
            format,
            content: to_csv(batch)?,
        }),
        ExportFormat::Excel => Ok(Artifact::Binary {
            format,
            content: to_xlsx(batch, sheet_name)?,
        }),
    }
}

fn to_json(batch: &Batch) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(batch)?)
}

fn to_csv(batch: &Batch) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(column_headers())?;

    for record in batch.records() {
        let (url, cells) = flatten(record);
        let mut row = Vec::with_capacity(cells.len() + 1);
        row.push(url);
        row.extend(cells.iter().map(ScoreCell::to_string));
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}

fn to_xlsx(batch: &Batch, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in column_headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, record) in batch.records().iter().enumerate() {
        let row = (i + 1) as u32;
        let (url, cells) = flatten(record);
        worksheet.write_string(row, 0, &url)?;
        for (j, cell) in cells.iter().enumerate() {
            let col = (j + 1) as u16;
            match cell {
                ScoreCell::Value(v) => worksheet.write_number(row, col, *v)?,
                ScoreCell::NotAvailable => worksheet.write_string(row, col, NOT_AVAILABLE)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}
