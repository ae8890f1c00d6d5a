//! Text to numeric conversion.

use super::Transform;
use crate::{
    error::Result,
    snapshot::{parse_number, Column, Snapshot},
};

/// Converts a text column to numeric. Values that do not parse become
/// missing; a column that is already numeric is returned unchanged.
#[derive(Debug, Clone)]
pub struct ConvertNumeric {
    column: String,
}

impl ConvertNumeric {
    /// Creates the transform for `column`.
    pub fn new<S: Into<String>>(column: S) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// Returns the column name.
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Transform for ConvertNumeric {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let idx = snapshot.column_index(&self.column)?;
        let Some(arr) = snapshot.text_array(idx) else {
            return Ok(snapshot.clone());
        };
        let values: Vec<Option<f64>> = arr.iter().map(|v| v.and_then(parse_number)).collect();
        let lost = values.iter().filter(|v| v.is_none()).count()
            - arr.iter().filter(|v| v.is_none()).count();
        if lost > 0 {
            tracing::warn!(column = %self.column, lost, "unparseable values became missing");
        }
        snapshot.replace_column(idx, Column::numeric(values))
    }

    fn describe(&self) -> String {
        format!("Converted {} to numeric", self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ColumnKind;

    #[test]
    fn test_convert_text_column() {
        let snap = Snapshot::from_columns([(
            "code",
            Column::text([Some("10"), Some(" 2.5 "), None, Some("x")]),
        )])
        .expect("snapshot");

        let converted = ConvertNumeric::new("code").apply(&snap).expect("convert");
        assert_eq!(converted.kind(0), ColumnKind::Numeric);
        assert_eq!(
            converted.column("code").expect("code"),
            Column::numeric([Some(10.0), Some(2.5), None, None])
        );
    }

    #[test]
    fn test_convert_numeric_column_unchanged() {
        let snap = Snapshot::from_columns([("v", Column::numeric([Some(1.0), None]))])
            .expect("snapshot");
        assert_eq!(ConvertNumeric::new("v").apply(&snap).expect("convert"), snap);
    }

    #[test]
    fn test_convert_unknown_column() {
        let snap = Snapshot::empty();
        assert!(ConvertNumeric::new("v").apply(&snap).is_err());
    }
}
