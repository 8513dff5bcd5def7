use std::{
    fmt,
    io::{Read, Write},
};

use csv::{ByteRecord, StringRecord};
use thiserror::Error;

use crate::domain::{Label, RowError, RowOutcome};

pub const ANNOTATION_COLUMNS: [&str; 4] = [
    "Translated",
    "Prediction",
    "Confidence (%)",
    "Phishing Detected",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("could not parse the uploaded table: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not write the classified table: {0}")]
    Io(#[from] std::io::Error),
    #[error("the uploaded table has no header row")]
    Empty,
    #[error("column `{column}` not found (available: {available})")]
    UnknownColumn { column: String, available: String },
    #[error("{outcomes} results for {rows} rows")]
    RowCountMismatch { rows: usize, outcomes: usize },
}

/// An uploaded CSV of messages. Extra columns are carried through untouched.
#[derive(Debug, Clone)]
pub struct MessageTable {
    headers: StringRecord,
    rows: Vec<ByteRecord>,
    skipped: usize,
}

impl MessageTable {
    /// Rows with more fields than the header are skipped, not fatal.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(TableError::Empty);
        }

        let mut rows = Vec::new();
        let mut skipped = 0;
        for record in reader.byte_records() {
            let record = record?;
            if record.len() > headers.len() {
                tracing::warn!(
                    target: "table",
                    line = record.position().map(|p| p.line()),
                    fields = record.len(),
                    expected = headers.len(),
                    "skipping malformed line"
                );
                skipped += 1;
                continue;
            }
            rows.push(record);
        }

        tracing::info!(target: "table", rows = rows.len(), skipped, "table loaded");
        Ok(Self {
            headers,
            rows,
            skipped,
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn column_index(&self, column: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| TableError::UnknownColumn {
                column: column.to_string(),
                available: self.headers.iter().collect::<Vec<_>>().join(", "),
            })
    }

    /// The text of `column` for every row, or the reason a row has none.
    pub fn message_cells(&self, column: &str) -> Result<Vec<Result<String, RowError>>, TableError> {
        let idx = self.column_index(column)?;
        Ok(self
            .rows
            .iter()
            .map(|row| match row.get(idx) {
                None => Err(RowError::MissingValue {
                    column: column.to_string(),
                }),
                Some(bytes) => String::from_utf8(bytes.to_vec()).map_err(|_| RowError::NotText {
                    column: column.to_string(),
                }),
            })
            .collect())
    }

    /// Writes the table with the annotation columns appended. `outcomes`
    /// must hold one entry per row, in row order.
    pub fn write_annotated<W: Write>(
        &self,
        outcomes: &[RowOutcome],
        writer: W,
    ) -> Result<(), TableError> {
        if outcomes.len() != self.rows.len() {
            return Err(TableError::RowCountMismatch {
                rows: self.rows.len(),
                outcomes: outcomes.len(),
            });
        }

        let mut writer = csv::Writer::from_writer(writer);
        let mut header = self.headers.as_byte_record().clone();
        for column in ANNOTATION_COLUMNS {
            header.push_field(column.as_bytes());
        }
        writer.write_byte_record(&header)?;

        let width = self.headers.len();
        for (row, outcome) in self.rows.iter().zip(outcomes) {
            let mut record = row.clone();
            while record.len() < width {
                record.push_field(b"");
            }
            match outcome {
                Ok(annotated) => {
                    record.push_field(annotated.normalized().as_bytes());
                    record.push_field(annotated.classification.label.as_str().as_bytes());
                    record.push_field(format!("{:.2}", annotated.classification.confidence).as_bytes());
                    record.push_field(if annotated.phishing { "True" } else { "False" }.as_bytes());
                }
                Err(err) => {
                    record.push_field(b"");
                    record.push_field(format!("Error: {err}").as_bytes());
                    record.push_field(b"");
                    record.push_field(b"");
                }
            }
            writer.write_byte_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Counts shown after a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub spam: usize,
    pub ham: usize,
    pub phishing: usize,
    pub translated: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn new(outcomes: &[RowOutcome], skipped: usize) -> Self {
        let mut summary = Self {
            rows: outcomes.len(),
            skipped,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(record) => {
                    match record.classification.label {
                        Label::Spam => summary.spam += 1,
                        Label::Ham => summary.ham += 1,
                    }
                    if record.phishing {
                        summary.phishing += 1;
                    }
                    if record.normalization.is_translated() {
                        summary.translated += 1;
                    }
                }
                Err(_) => summary.errors += 1,
            }
        }
        summary
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows: {} spam, {} ham, {} with phishing links, {} translated, {} errors ({} malformed lines skipped)",
            self.rows, self.spam, self.ham, self.phishing, self.translated, self.errors, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnnotatedRecord, ClassificationResult, Normalization};

    fn record(text: &str, label: Label, confidence: f64, phishing: bool) -> RowOutcome {
        Ok(AnnotatedRecord {
            original: text.to_string(),
            normalization: Normalization::Unchanged {
                text: text.to_string(),
            },
            classification: ClassificationResult { label, confidence },
            phishing,
        })
    }

    #[test]
    fn lists_columns_and_cells() {
        let data = b"id,message,sender\n1,hello,ann\n2,\"free, prize\",bob\n";
        let table = MessageTable::from_reader(&data[..]).unwrap();
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["id", "message", "sender"]);
        assert_eq!(
            table.message_cells("message").unwrap(),
            vec![Ok("hello".to_string()), Ok("free, prize".to_string())]
        );
    }

    #[test]
    fn unknown_column_is_an_upload_error() {
        let table = MessageTable::from_reader(&b"id,message\n1,hi\n"[..]).unwrap();
        let err = table.message_cells("text").unwrap_err();
        assert!(matches!(err, TableError::UnknownColumn { ref column, .. } if column == "text"));
        assert!(err.to_string().contains("id, message"));
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert!(matches!(MessageTable::from_reader(&b""[..]), Err(TableError::Empty)));
    }

    #[test]
    fn overlong_lines_are_skipped_and_short_rows_marked() {
        let table = MessageTable::from_reader(&b"id,message\n1,hi\n2,a,b,c\n3\n"[..]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped(), 1);
        let cells = table.message_cells("message").unwrap();
        assert_eq!(cells[0], Ok("hi".to_string()));
        assert!(matches!(cells[1], Err(RowError::MissingValue { .. })));
    }

    #[test]
    fn non_utf8_cells_are_marked() {
        let table = MessageTable::from_reader(&b"message\n\xff\xfe\nok\n"[..]).unwrap();
        let cells = table.message_cells("message").unwrap();
        assert!(matches!(cells[0], Err(RowError::NotText { .. })));
        assert_eq!(cells[1], Ok("ok".to_string()));
    }

    #[test]
    fn writes_passthrough_and_annotation_columns() {
        let table = MessageTable::from_reader(&b"id,message\n1,win cash\n2\n"[..]).unwrap();
        let outcomes = vec![
            record("win cash", Label::Spam, 91.5, false),
            Err(RowError::MissingValue {
                column: "message".into(),
            }),
        ];
        let mut out = Vec::new();
        table.write_annotated(&outcomes, &mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert_eq!(
            written,
            "id,message,Translated,Prediction,Confidence (%),Phishing Detected\n\
             1,win cash,win cash,Spam,91.50,False\n\
             2,,,Error: missing value in column `message`,,\n"
        );
    }

    #[test]
    fn mismatched_outcomes_are_rejected() {
        let table = MessageTable::from_reader(&b"message\nhi\n"[..]).unwrap();
        let err = table.write_annotated(&[], Vec::new()).unwrap_err();
        assert!(matches!(err, TableError::RowCountMismatch { rows: 1, outcomes: 0 }));
    }

    #[test]
    fn summary_counts_outcomes() {
        let outcomes = vec![
            record("a", Label::Spam, 80.0, true),
            record("b", Label::Ham, 70.0, false),
            record("c", Label::Spam, 60.0, false),
            Err(RowError::NotText {
                column: "m".into(),
            }),
        ];
        let summary = BatchSummary::new(&outcomes, 2);
        assert_eq!(
            summary,
            BatchSummary {
                rows: 4,
                spam: 2,
                ham: 1,
                phishing: 1,
                translated: 0,
                errors: 1,
                skipped: 2,
            }
        );
    }
}
