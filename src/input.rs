use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read URL list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV URL list: {0}")]
    Csv(#[from] csv::Error),
}

/// Reads candidate URLs from a bulk upload file.
///
/// `.csv` files use the column headed `url` (any case), falling back to the
/// first column. Anything else is one URL per line. Blank lines and `#`
/// comments are skipped, values are trimmed, and repeats are dropped.
pub fn read_url_list(path: &Path) -> Result<Vec<String>, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let urls = if is_csv {
        parse_csv(&content)?
    } else {
        parse_lines(&content)
    };
    info!("Read {} URL(s) from {}", urls.len(), path.display());
    Ok(urls)
}

/// One URL per line
pub fn parse_lines(content: &str) -> Vec<String> {
    dedup(content.lines())
}

/// URLs from the `url` column, or the first column when there is none
pub fn parse_csv(content: &str) -> Result<Vec<String>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?);
    }

    let column = rows
        .first()
        .and_then(|header| {
            header
                .iter()
                .position(|field| field.trim().eq_ignore_ascii_case("url"))
        });
    let (column, skip) = match column {
        Some(column) => (column, 1),
        None => (0, 0),
    };
    debug!("Reading URLs from CSV column {}", column);

    Ok(dedup(
        rows.iter()
            .skip(skip)
            .filter_map(|row| row.get(column)),
    ))
}

fn dedup<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.starts_with('#'))
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_string)
        .collect()
}
