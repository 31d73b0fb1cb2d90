//! Record parser
//!
//! Splits one pipe-delimited accounting line into field values, positionally
//! against a column list.

use crate::domain::field::{Field, FieldValues};
use crate::error::ParseError;

/// Column delimiter of `sacct --parsable2`
pub const DELIMITER: char = '|';

/// One accounting line, mapped onto the schema
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Step-qualified identifier as printed, e.g. `123_4.batch`
    pub step_id: String,
    /// Job identifier with the step suffix removed, e.g. `123_4`
    pub job_id: String,
    /// Column values; fields not in the column list are empty
    pub values: FieldValues,
}

/// Strip the `.step` suffix from a step-qualified identifier
pub fn strip_step(step_id: &str) -> &str {
    step_id.split('.').next().unwrap_or(step_id)
}

/// Parse one line against `columns`
///
/// The line is trimmed before splitting. A single trailing empty column, as
/// left by a trailing delimiter, is dropped. The first column is taken as the
/// step identifier.
///
/// # Errors
/// [`ParseError::ColumnCount`] if the number of values differs from the
/// number of columns.
pub fn parse_line(line: &str, columns: &[Field]) -> Result<RawRecord, ParseError> {
    let mut parts: Vec<&str> = line.trim().split(DELIMITER).collect();

    if parts.len() == columns.len() + 1 && parts.last() == Some(&"") {
        parts.pop();
    }

    if parts.len() != columns.len() {
        return Err(ParseError::ColumnCount {
            expected: columns.len(),
            found: parts.len(),
        });
    }

    let mut values = FieldValues::new();
    for (field, value) in columns.iter().zip(&parts) {
        values.set(*field, *value);
    }

    let step_id = parts.first().copied().unwrap_or_default().to_string();
    let job_id = strip_step(&step_id).to_string();

    Ok(RawRecord {
        step_id,
        job_id,
        values,
    })
}
