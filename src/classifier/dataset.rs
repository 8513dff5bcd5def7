use std::{fs, path::Path};

use thiserror::Error;

use crate::domain::{Label, LabeledMessage};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset has no label/text columns (expected `v1`,`v2` or `label`,`text`)")]
    MissingColumns,
    #[error("unknown label `{value}` on line {line}")]
    InvalidLabel { line: u64, value: String },
    #[error("dataset contains no messages")]
    Empty,
}

/// Reads the labeled dataset at `path`. The file is decoded as Latin-1.
pub fn load_dataset(path: &Path) -> Result<Vec<LabeledMessage>, DatasetError> {
    let bytes = fs::read(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_dataset(&bytes)
}

pub fn parse_dataset(bytes: &[u8]) -> Result<Vec<LabeledMessage>, DatasetError> {
    let decoded = decode_latin1(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let headers = reader.headers()?.clone();
    let (label_idx, text_idx) = find_columns(&headers, "v1", "v2")
        .or_else(|| find_columns(&headers, "label", "text"))
        .ok_or(DatasetError::MissingColumns)?;

    let mut messages = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw_label = record.get(label_idx).unwrap_or_default();
        let label = Label::from_dataset(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
            line,
            value: raw_label.to_string(),
        })?;
        let text = record.get(text_idx).unwrap_or_default();
        messages.push(LabeledMessage::new(label, text));
    }

    if messages.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(messages)
}

fn find_columns(headers: &csv::StringRecord, label: &str, text: &str) -> Option<(usize, usize)> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    Some((position(label)?, position(text)?))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
