pub mod record;
pub mod types;

pub use record::{AnnotatedRecord, Normalization, RowError, RowOutcome};
pub use types::{ClassificationResult, Label, LabeledMessage};
