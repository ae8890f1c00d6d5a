//! Immutable tabular snapshots.
//!
//! A [`Snapshot`] is an ordered set of uniquely named, equal-length columns.
//! Every column is either numeric (`Float64`) or text (`Utf8`); both are
//! nullable and a null is a missing value. Construction normalizes whatever
//! Arrow produced (integers, decimals, booleans, dates, `NaN`) into that
//! two-type model so the statistics and transforms only ever see two array
//! types.

use std::{
    collections::HashSet,
    io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
    sync::Arc,
};

use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float64Array, RecordBatch, StringArray},
    compute::{cast, concat_batches, filter_record_batch},
    datatypes::{DataType, Field, Schema, SchemaRef},
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    file::properties::WriterProperties,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    transform::Transform,
};

/// Cell values read as missing when loading delimited text.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true if `cell` is one of the [`MISSING_MARKERS`].
pub fn is_missing_marker(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

/// Parses a cell as a number, ignoring surrounding whitespace.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// 64-bit floating point values.
    Numeric,
    /// UTF-8 strings.
    Text,
}

impl ColumnKind {
    /// The dtype label reported in diagnoses.
    pub fn dtype_name(self) -> &'static str {
        match self {
            Self::Numeric => "float64",
            Self::Text => "object",
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Numeric => DataType::Float64,
            Self::Text => DataType::Utf8,
        }
    }
}

/// Owned values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Numeric values, `None` for missing.
    Numeric(Vec<Option<f64>>),
    /// Text values, `None` for missing.
    Text(Vec<Option<String>>),
}

impl Column {
    /// Builds a numeric column. `NaN` is treated as missing.
    pub fn numeric(values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::Numeric(
            values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect(),
        )
    }

    /// Builds a text column.
    pub fn text<S: Into<String>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        Self::Text(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// True if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type of the column.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Text(_) => ColumnKind::Text,
        }
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Infers the type of a column of raw cells: numeric iff every
    /// non-missing cell parses as a number.
    fn infer(raw: Vec<Option<String>>) -> Self {
        let cells: Vec<Option<String>> = raw
            .into_iter()
            .map(|cell| cell.filter(|s| !is_missing_marker(s)))
            .collect();

        let parsed: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| match cell {
                None => Some(None),
                Some(s) => parse_number(s).map(Some),
            })
            .collect();

        match parsed {
            Some(values) => Self::numeric(values),
            None => Self::Text(cells),
        }
    }

    fn into_array(self) -> ArrayRef {
        match self {
            Self::Numeric(values) => Arc::new(Float64Array::from(values)),
            Self::Text(values) => Arc::new(StringArray::from(values)),
        }
    }

    fn from_array(array: &ArrayRef) -> Self {
        if let Some(arr) = array.as_any().downcast_ref::<Float64Array>() {
            Self::Numeric(arr.iter().collect())
        } else if let Some(arr) = array.as_any().downcast_ref::<StringArray>() {
            Self::Text(arr.iter().map(|v| v.map(str::to_string)).collect())
        } else {
            Self::Text(vec![None; array.len()])
        }
    }
}

/// On-disk formats a snapshot can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma separated values with a header row.
    Csv,
    /// Apache Parquet.
    Parquet,
    /// Newline delimited JSON objects.
    JsonLines,
}

impl FileFormat {
    /// Picks the format from a path or filename extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            "json" | "jsonl" | "ndjson" => Ok(Self::JsonLines),
            other => Err(Error::unsupported_format(other)),
        }
    }
}

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Delimiter character (default is comma).
    pub delimiter: u8,
    /// Batch size for reading.
    pub batch_size: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            batch_size: 8192,
        }
    }
}

impl CsvOptions {
    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delimiter character.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// An immutable table of numeric and text columns.
///
/// Cloning is cheap: Arrow buffers are shared, never copied, and no method
/// mutates a snapshot in place.
///
/// # Example
///
/// ```
/// use tidyset::{Column, Snapshot};
///
/// let snapshot = Snapshot::from_columns([
///     ("age", Column::numeric([Some(25.0), None])),
///     ("city", Column::text([Some("NY"), Some("LA")])),
/// ])
/// .unwrap();
/// assert_eq!(snapshot.num_rows(), 2);
/// assert_eq!(snapshot.missing_count(0), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    batch: RecordBatch,
}

impl Snapshot {
    /// Wraps a RecordBatch, normalizing every column to `Float64` or `Utf8`.
    ///
    /// # Errors
    ///
    /// Returns an error if two columns share a name or a column type cannot
    /// be represented as text.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(Error::DuplicateColumn {
                    name: field.name().clone(),
                });
            }
        }

        let already_normalized = batch.columns().iter().all(|c| {
            matches!(c.data_type(), DataType::Utf8)
                || (matches!(c.data_type(), DataType::Float64) && !has_nan(c))
        }) && schema.metadata().is_empty()
            && schema
                .fields()
                .iter()
                .all(|f| f.is_nullable() && f.metadata().is_empty());
        if already_normalized {
            return Ok(Self { batch });
        }

        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut arrays = Vec::with_capacity(schema.fields().len());
        for (field, array) in schema.fields().iter().zip(batch.columns()) {
            let array = normalize_array(array)?;
            fields.push(Field::new(field.name(), array.data_type().clone(), true));
            arrays.push(array);
        }

        Self::assemble(fields, arrays, batch.num_rows())
    }

    /// A snapshot with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Builds a snapshot from named columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns differ in length or names repeat.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut arrays = Vec::new();
        let mut seen = HashSet::new();
        let mut rows: Option<usize> = None;

        for (name, column) in columns {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateColumn { name });
            }
            match rows {
                Some(n) if n != column.len() => {
                    return Err(Error::schema_mismatch(format!(
                        "column '{}' has {} rows, expected {}",
                        name,
                        column.len(),
                        n
                    )));
                }
                _ => rows = Some(column.len()),
            }
            fields.push(Field::new(name, column.kind().data_type(), true));
            arrays.push(column.into_array());
        }

        match rows {
            Some(n) => Self::assemble(fields, arrays, n),
            None => Ok(Self::empty()),
        }
    }

    fn assemble(fields: Vec<Field>, arrays: Vec<ArrayRef>, rows: usize) -> Result<Self> {
        let schema = Arc::new(Schema::new(fields));
        let batch = if arrays.is_empty() {
            RecordBatch::try_new_with_options(
                schema,
                arrays,
                &arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(rows)),
            )?
        } else {
            RecordBatch::try_new(schema, arrays)?
        };
        Ok(Self { batch })
    }

    fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Self::new(batch)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Loading
    // ═══════════════════════════════════════════════════════════════════

    /// Loads a snapshot from CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid delimited data.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_bytes(data.as_bytes())
    }

    /// Loads a snapshot from CSV bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid delimited data.
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        Self::from_csv_reader(Cursor::new(data), &CsvOptions::default())
    }

    /// Loads a snapshot from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        Self::from_csv_reader(BufReader::new(file), &CsvOptions::default())
    }

    /// Loads a snapshot from any seekable CSV source.
    ///
    /// Every column is first read as text, then typed: a column becomes
    /// numeric iff every non-missing cell parses as a number.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no header row or a record has the wrong
    /// number of fields.
    pub fn from_csv_reader<R: Read + Seek>(mut reader: R, options: &CsvOptions) -> Result<Self> {
        use arrow_csv::{reader::Format, ReaderBuilder};

        let format = Format::default()
            .with_header(true)
            .with_delimiter(options.delimiter);
        let (inferred, _) = format.infer_schema(&mut reader, Some(1))?;
        if inferred.fields().is_empty() {
            return Err(Error::parse("missing header row"));
        }
        reader
            .seek(SeekFrom::Start(0))
            .map_err(Error::io_no_path)?;

        let text_schema = Arc::new(Schema::new(
            inferred
                .fields()
                .iter()
                .map(|f| Field::new(f.name(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));

        let csv = ReaderBuilder::new(Arc::clone(&text_schema))
            .with_header(true)
            .with_delimiter(options.delimiter)
            .with_batch_size(options.batch_size)
            .build(reader)?;
        let batches = csv.collect::<std::result::Result<Vec<_>, _>>()?;
        let raw = concat_batches(&text_schema, &batches)?;

        let columns = text_schema
            .fields()
            .iter()
            .zip(raw.columns())
            .map(|(field, array)| {
                let cells = array
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .map(|arr| arr.iter().map(|v| v.map(str::to_string)).collect())
                    .unwrap_or_else(|| vec![None; array.len()]);
                (field.name().clone(), Column::infer(cells))
            })
            .collect::<Vec<_>>();

        Self::from_columns(columns)
    }

    /// Loads a snapshot from Parquet bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid Parquet file.
    pub fn from_parquet_bytes(data: &[u8]) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::copy_from_slice(data))?;
        let schema = Arc::clone(builder.schema());
        let reader = builder.build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_batches(schema, &batches)
    }

    /// Loads a snapshot from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::io(e, path))?;
        Self::from_parquet_bytes(&data)
    }

    /// Loads a snapshot from newline delimited JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid JSON Lines.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        Self::from_json_reader(Cursor::new(data))
    }

    fn from_json_reader<R: BufRead + Seek>(mut reader: R) -> Result<Self> {
        use arrow_json::{reader::infer_json_schema, ReaderBuilder};

        let (schema, _) = infer_json_schema(&mut reader, None)?;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(Error::io_no_path)?;

        let schema = Arc::new(schema);
        let json = ReaderBuilder::new(Arc::clone(&schema)).build(reader)?;
        let batches = json.collect::<std::result::Result<Vec<_>, _>>()?;
        Self::from_batches(schema, &batches)
    }

    /// Loads a snapshot from a JSON Lines file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Loads a snapshot from bytes in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not parse in that format.
    pub fn from_bytes(data: &[u8], format: FileFormat) -> Result<Self> {
        match format {
            FileFormat::Csv => Self::from_csv_bytes(data),
            FileFormat::Parquet => Self::from_parquet_bytes(data),
            FileFormat::JsonLines => Self::from_json_bytes(data),
        }
    }

    /// Loads a snapshot from a file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown extensions or unreadable files.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match FileFormat::from_path(path)? {
            FileFormat::Csv => Self::from_csv(path),
            FileFormat::Parquet => Self::from_parquet(path),
            FileFormat::JsonLines => Self::from_json(path),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Writing
    // ═══════════════════════════════════════════════════════════════════

    /// Serializes the snapshot as CSV with a header row. Missing cells are
    /// written as empty fields.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow fails to format a value.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut writer = arrow_csv::WriterBuilder::new()
                .with_header(true)
                .build(&mut buffer);
            writer.write(&self.batch)?;
        }
        Ok(buffer)
    }

    /// Writes the snapshot to a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_csv_bytes()?;
        std::fs::write(path, data).map_err(|e| Error::io(e, path))
    }

    /// Serializes the snapshot as Parquet.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_parquet_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(&mut buffer, self.batch.schema(), Some(props))?;
        writer.write(&self.batch)?;
        writer.close()?;
        Ok(buffer)
    }

    /// Writes the snapshot to a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_parquet_bytes()?;
        std::fs::write(path, data).map_err(|e| Error::io(e, path))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Access
    // ═══════════════════════════════════════════════════════════════════

    /// The underlying RecordBatch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// The schema; every field is nullable `Float64` or `Utf8`.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Number of cells (rows times columns).
    pub fn num_cells(&self) -> usize {
        self.num_rows() * self.num_columns()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Name of the column at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn column_name(&self, idx: usize) -> String {
        self.batch.schema().field(idx).name().clone()
    }

    /// Position of the named column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no column has that name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.batch
            .schema()
            .column_with_name(name)
            .map(|(idx, _)| idx)
            .ok_or_else(|| Error::column_not_found(name))
    }

    /// Storage type of the column at `idx`.
    pub fn kind(&self, idx: usize) -> ColumnKind {
        match self.batch.column(idx).data_type() {
            DataType::Float64 => ColumnKind::Numeric,
            _ => ColumnKind::Text,
        }
    }

    /// Indices of the numeric columns, in column order.
    pub fn numeric_indices(&self) -> Vec<usize> {
        (0..self.num_columns())
            .filter(|&i| self.kind(i) == ColumnKind::Numeric)
            .collect()
    }

    /// The column at `idx` as a `Float64Array`, if it is numeric.
    pub fn numeric_array(&self, idx: usize) -> Option<&Float64Array> {
        self.batch
            .column(idx)
            .as_any()
            .downcast_ref::<Float64Array>()
    }

    /// The column at `idx` as a `StringArray`, if it is text.
    pub fn text_array(&self, idx: usize) -> Option<&StringArray> {
        self.batch.column(idx).as_any().downcast_ref::<StringArray>()
    }

    /// Number of missing cells in the column at `idx`.
    pub fn missing_count(&self, idx: usize) -> usize {
        self.batch.column(idx).null_count()
    }

    /// Total missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.batch.columns().iter().map(|c| c.null_count()).sum()
    }

    /// Owned copy of the named column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if no column has that name.
    pub fn column(&self, name: &str) -> Result<Column> {
        let idx = self.column_index(name)?;
        Ok(Column::from_array(self.batch.column(idx)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Derivation
    // ═══════════════════════════════════════════════════════════════════

    /// Returns a copy with the column at `idx` replaced. The column type may
    /// change.
    ///
    /// # Errors
    ///
    /// Returns an error if `column` has a different length.
    pub fn replace_column(&self, idx: usize, column: Column) -> Result<Self> {
        if column.len() != self.num_rows() {
            return Err(Error::schema_mismatch(format!(
                "replacement for column {} has {} rows, expected {}",
                idx,
                column.len(),
                self.num_rows()
            )));
        }
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();

        let field = fields
            .get_mut(idx)
            .ok_or_else(|| Error::column_not_found(format!("#{idx}")))?;
        *field = Field::new(field.name(), column.kind().data_type(), true);
        arrays[idx] = column.into_array();

        Self::assemble(fields, arrays, self.num_rows())
    }

    /// Returns a copy holding only the rows where `keep` is true.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask length differs from the row count.
    pub fn filter_rows(&self, keep: &BooleanArray) -> Result<Self> {
        if keep.len() != self.num_rows() {
            return Err(Error::schema_mismatch(format!(
                "row mask has {} entries, expected {}",
                keep.len(),
                self.num_rows()
            )));
        }
        if self.num_columns() == 0 {
            let kept = keep.true_count();
            return Self::assemble(Vec::new(), Vec::new(), kept);
        }
        Ok(Self {
            batch: filter_record_batch(&self.batch, keep)?,
        })
    }

    /// Applies a transform, returning the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform fails.
    pub fn with_transform<T: Transform + ?Sized>(&self, transform: &T) -> Result<Self> {
        transform.apply(self)
    }
}

fn has_nan(array: &ArrayRef) -> bool {
    array
        .as_any()
        .downcast_ref::<Float64Array>()
        .is_some_and(|arr| arr.iter().flatten().any(f64::is_nan))
}

fn nan_to_null(array: &ArrayRef) -> ArrayRef {
    match array.as_any().downcast_ref::<Float64Array>() {
        Some(arr) if has_nan(array) => Arc::new(
            arr.iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect::<Float64Array>(),
        ),
        _ => Arc::clone(array),
    }
}

fn normalize_array(array: &ArrayRef) -> Result<ArrayRef> {
    match array.data_type() {
        DataType::Float64 => Ok(nan_to_null(array)),
        DataType::Utf8 => Ok(Arc::clone(array)),
        DataType::Null => Ok(Arc::new(Float64Array::new_null(array.len()))),
        dt if dt.is_numeric() => {
            let as_float = cast(array, &DataType::Float64)?;
            Ok(nan_to_null(&as_float))
        }
        _ => Ok(cast(array, &DataType::Utf8)?),
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::Int64Array;

    use super::*;

    fn people() -> Snapshot {
        Snapshot::from_columns([
            ("age", Column::numeric([Some(25.0), Some(30.0), None, Some(1000.0)])),
            ("city", Column::text([Some("NY"), None, Some("NY"), Some("LA")])),
        ])
        .ok()
        .unwrap_or_else(|| panic!("Should build snapshot"))
    }

    #[test]
    fn test_from_columns_shape() {
        let snap = people();
        assert_eq!(snap.num_rows(), 4);
        assert_eq!(snap.num_columns(), 2);
        assert_eq!(snap.num_cells(), 8);
        assert_eq!(snap.column_names(), vec!["age", "city"]);
        assert_eq!(snap.kind(0), ColumnKind::Numeric);
        assert_eq!(snap.kind(1), ColumnKind::Text);
        assert_eq!(snap.total_missing(), 2);
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Snapshot::from_columns([
            ("a", Column::numeric([Some(1.0)])),
            ("b", Column::numeric([Some(1.0), Some(2.0)])),
        ]);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_from_columns_rejects_duplicate_names() {
        let result = Snapshot::from_columns([
            ("a", Column::numeric([Some(1.0)])),
            ("a", Column::numeric([Some(2.0)])),
        ]);
        assert!(matches!(result, Err(Error::DuplicateColumn { .. })));
    }

    #[test]
    fn test_nan_is_missing() {
        let snap = Snapshot::from_columns([("x", Column::numeric([Some(f64::NAN), Some(1.0)]))])
            .expect("snapshot");
        assert_eq!(snap.missing_count(0), 1);
    }

    #[test]
    fn test_new_normalizes_integers_and_booleans() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("n", DataType::Int64, false),
            Field::new("flag", DataType::Boolean, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(BooleanArray::from(vec![Some(true), None])),
            ],
        )
        .expect("batch");

        let snap = Snapshot::new(batch).expect("snapshot");
        assert_eq!(snap.kind(0), ColumnKind::Numeric);
        assert_eq!(snap.kind(1), ColumnKind::Text);
        assert_eq!(
            snap.column("n").expect("column"),
            Column::Numeric(vec![Some(1.0), Some(2.0)])
        );
        assert_eq!(
            snap.column("flag").expect("column"),
            Column::Text(vec![Some("true".to_string()), None])
        );
        assert!(snap.schema().fields().iter().all(|f| f.is_nullable()));
    }

    #[test]
    fn test_csv_type_inference() {
        let snap = Snapshot::from_csv_str("age,city,code\n25,NY,7\n30,,x\n,NY,8\n1000,LA,9\n")
            .expect("csv");
        assert_eq!(snap.num_rows(), 4);
        assert_eq!(snap.kind(0), ColumnKind::Numeric);
        assert_eq!(snap.kind(1), ColumnKind::Text);
        assert_eq!(snap.kind(2), ColumnKind::Text);
        assert_eq!(snap.missing_count(0), 1);
        assert_eq!(snap.missing_count(1), 1);
    }

    #[test]
    fn test_csv_missing_markers() {
        let snap = Snapshot::from_csv_str("v,w\nNA,a\n1.5,NULL\nnan,b\n").expect("csv");
        assert_eq!(snap.kind(0), ColumnKind::Numeric);
        assert_eq!(
            snap.column("v").expect("column"),
            Column::Numeric(vec![None, Some(1.5), None])
        );
        assert_eq!(snap.missing_count(1), 1);
    }

    #[test]
    fn test_csv_header_only() {
        let snap = Snapshot::from_csv_str("a,b\n").expect("csv");
        assert_eq!(snap.num_rows(), 0);
        assert_eq!(snap.num_columns(), 2);
    }

    #[test]
    fn test_csv_empty_input_is_parse_error() {
        let result = Snapshot::from_csv_str("");
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_ragged_row_fails() {
        let result = Snapshot::from_csv_str("a,b\n1,2\n3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let snap = people();
        let bytes = snap.to_csv_bytes().expect("csv bytes");
        let reloaded = Snapshot::from_csv_bytes(&bytes).expect("reload");
        assert_eq!(reloaded, snap);
    }

    #[test]
    fn test_parquet_round_trip() {
        let snap = people();
        let bytes = snap.to_parquet_bytes().expect("parquet bytes");
        let reloaded = Snapshot::from_parquet_bytes(&bytes).expect("reload");
        assert_eq!(reloaded.column_names(), snap.column_names());
        assert_eq!(reloaded.column("age").ok(), snap.column("age").ok());
        assert_eq!(reloaded.column("city").ok(), snap.column("city").ok());
    }

    #[test]
    fn test_json_lines() {
        let data = b"{\"a\": 1, \"b\": \"x\"}\n{\"a\": null, \"b\": \"y\"}\n";
        let snap = Snapshot::from_json_bytes(data).expect("json");
        assert_eq!(snap.num_rows(), 2);
        assert_eq!(snap.kind(snap.column_index("a").expect("a")), ColumnKind::Numeric);
        assert_eq!(snap.missing_count(snap.column_index("a").expect("a")), 1);
    }

    #[test]
    fn test_replace_column_changes_type() {
        let snap = Snapshot::from_columns([("code", Column::text([Some("1"), Some("2")]))])
            .expect("snapshot");
        let replaced = snap
            .replace_column(0, Column::numeric([Some(1.0), Some(2.0)]))
            .expect("replace");
        assert_eq!(replaced.kind(0), ColumnKind::Numeric);
        assert_eq!(snap.kind(0), ColumnKind::Text);
    }

    #[test]
    fn test_filter_rows() {
        let snap = people();
        let kept = snap
            .filter_rows(&BooleanArray::from(vec![true, false, true, false]))
            .expect("filter");
        assert_eq!(kept.num_rows(), 2);
        assert_eq!(snap.num_rows(), 4);
    }

    #[test]
    fn test_column_not_found() {
        let result = people().column_index("salary");
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(FileFormat::from_path("a.CSV").ok(), Some(FileFormat::Csv));
        assert_eq!(
            FileFormat::from_path("a.parquet").ok(),
            Some(FileFormat::Parquet)
        );
        assert_eq!(
            FileFormat::from_path("a.jsonl").ok(),
            Some(FileFormat::JsonLines)
        );
        assert!(FileFormat::from_path("a.xlsx").is_err());
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = Snapshot::empty();
        assert_eq!(snap.num_rows(), 0);
        assert_eq!(snap.num_columns(), 0);
        assert_eq!(snap.num_cells(), 0);
    }
}
