use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Date32Array, Float32Array, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{Record, SurveillanceDataset};

const DATE_FORMAT: &str = "%Y-%m-%d";
const REQUIRED_COLUMNS: [&str; 4] = ["date", "syndrome", "age_group", "relative_cases"];

/// Structural problems in an input file.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("column '{column}' has unsupported type {found}")]
    UnsupportedType { column: String, found: String },
    #[error("row {row}: '{value}' is not a valid {column}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: {column} is empty")]
    MissingValue { row: usize, column: &'static str },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a surveillance extract from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with at least `date,syndrome,age_group,relative_cases`
/// * `.json`    – `[{ "date": "2023-01-01", "syndrome": "SARI", ... }, ...]`
/// * `.parquet` – same columns; `date` as Date32 or ISO string
pub fn load_file(path: &Path) -> Result<SurveillanceDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows from {} (syndromes {:?})",
        dataset.len(),
        path.display(),
        dataset.syndromes
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row shape shared by CSV and JSON
// ---------------------------------------------------------------------------

/// One row as written by the upstream cleaning step. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: String,
    syndrome: String,
    age_group: String,
    relative_cases: Option<f64>,
    #[serde(default)]
    expected_lowerbound: Option<f64>,
    #[serde(default)]
    expected_upperbound: Option<f64>,
}

impl RawRecord {
    fn into_record(self, row: usize) -> Result<Record, SchemaError> {
        Ok(Record {
            date: parse_date(&self.date, row)?,
            syndrome: self.syndrome,
            age_group: self.age_group,
            relative_cases: required_cases(self.relative_cases, row)?,
            expected_lowerbound: present(self.expected_lowerbound),
            expected_upperbound: present(self.expected_upperbound),
        })
    }
}

fn parse_date(s: &str, row: usize) -> Result<NaiveDate, SchemaError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| SchemaError::InvalidValue {
        row,
        column: "date",
        value: s.to_string(),
    })
}

fn required_cases(value: Option<f64>, row: usize) -> Result<f64, SchemaError> {
    present(value).ok_or(SchemaError::MissingValue {
        row,
        column: "relative_cases",
    })
}

/// NaN counts as missing.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SurveillanceDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV text with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<SurveillanceDataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: csv::StringRecord = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(str::trim)
        .collect();
    reader.set_headers(headers.clone());
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SchemaError::MissingColumn(column).into());
        }
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(raw.into_record(row_no)?);
    }

    Ok(SurveillanceDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<SurveillanceDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json(&text)
}

/// Parse a records-oriented JSON array (`df.to_json(orient='records')` with ISO dates).
pub fn read_json(text: &str) -> Result<SurveillanceDataset> {
    let rows: Vec<RawRecord> = serde_json::from_str(text).context("parsing JSON")?;
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SurveillanceDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file written by pandas (`df.to_parquet()`) or polars.
///
/// Expected schema:
/// - `date`: Date32, Date64, Timestamp (any unit, truncated to the day) or Utf8 (`YYYY-MM-DD`)
/// - `syndrome`, `age_group`: Utf8 / LargeUtf8
/// - `relative_cases`: Float64 / Float32 / Int64
/// - `expected_lowerbound`, `expected_upperbound`: optional, nullable floats
fn load_parquet(path: &Path) -> Result<SurveillanceDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        records.extend(batch_records(&batch, records.len())?);
    }

    Ok(SurveillanceDataset::from_records(records))
}

fn batch_records(batch: &RecordBatch, first_row: usize) -> Result<Vec<Record>> {
    let dates = date_values(required_column(batch, "date")?, first_row)?;
    let syndromes = string_values(required_column(batch, "syndrome")?, "syndrome")?;
    let age_groups = string_values(required_column(batch, "age_group")?, "age_group")?;
    let cases = float_values(required_column(batch, "relative_cases")?, "relative_cases")?;
    let lower = optional_float_column(batch, "expected_lowerbound")?;
    let upper = optional_float_column(batch, "expected_upperbound")?;

    (0..batch.num_rows())
        .map(|i| -> Result<Record> {
            let row = first_row + i;
            let date = dates[i].ok_or(SchemaError::MissingValue { row, column: "date" })?;
            let syndrome = syndromes[i]
                .clone()
                .ok_or(SchemaError::MissingValue { row, column: "syndrome" })?;
            let age_group = age_groups[i]
                .clone()
                .ok_or(SchemaError::MissingValue { row, column: "age_group" })?;
            Ok(Record {
                date,
                syndrome,
                age_group,
                relative_cases: required_cases(cases[i], row)?,
                expected_lowerbound: lower.as_ref().and_then(|col| present(col[i])),
                expected_upperbound: upper.as_ref().and_then(|col| present(col[i])),
            })
        })
        .collect()
}

// -- Parquet / Arrow helpers --

fn required_column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a Arc<dyn Array>> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SchemaError::MissingColumn(name).into())
}

fn optional_float_column(batch: &RecordBatch, name: &'static str) -> Result<Option<Vec<Option<f64>>>> {
    batch
        .column_by_name(name)
        .map(|col| float_values(col, name))
        .transpose()
}

fn unsupported(column: &str, col: &Arc<dyn Array>) -> anyhow::Error {
    SchemaError::UnsupportedType {
        column: column.to_string(),
        found: format!("{:?}", col.data_type()),
    }
    .into()
}

fn string_values(col: &Arc<dyn Array>, column: &str) -> Result<Vec<Option<String>>> {
    let values = match col.data_type() {
        DataType::Utf8 => col
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        DataType::LargeUtf8 => col
            .as_string::<i64>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect(),
        _ => return Err(unsupported(column, col)),
    };
    Ok(values)
}

fn float_values(col: &Arc<dyn Array>, column: &str) -> Result<Vec<Option<f64>>> {
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map(f64::from)).collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.iter().map(|v| v.map(|i| i as f64)).collect())
    } else {
        Err(unsupported(column, col))
    }
}

/// Dates from a Date32 column, a timestamp column (time of day dropped) or
/// ISO strings. `first_row` offsets error rows to file positions.
fn date_values(col: &Arc<dyn Array>, first_row: usize) -> Result<Vec<Option<NaiveDate>>> {
    match col.data_type() {
        DataType::Date32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Date32Array>()
                .context("expected Date32Array")?;
            Ok((0..arr.len())
                .map(|i| if arr.is_null(i) { None } else { arr.value_as_date(i) })
                .collect())
        }
        DataType::Date64 | DataType::Timestamp(_, _) => {
            let days = cast(col, &DataType::Date32).context("casting date column to Date32")?;
            date_values(&days, first_row)
        }
        _ => string_values(col, "date")?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(|s| parse_date(&s, first_row + i))
                    .transpose()
                    .map_err(anyhow::Error::from)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use arrow::array::{ArrayRef, StringArray, TimestampMillisecondArray};
    use parquet::arrow::ArrowWriter;

    use super::*;

    const SAMPLE: &str = "\
,date,syndrome,age_group,relative_cases,expected_lowerbound,expected_upperbound
0,2023-01-01,SARI,0-4,1.5,1.0,2.0
1,2023-01-01,ILI,00+,0.25,,
2,2023-01-02,ARI,80+,3.0,NaN,4.0
";

    #[test]
    fn csv_rows_are_parsed() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.syndromes, vec!["SARI", "ILI", "ARI"]);

        let first = &ds.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(first.age_group, "0-4");
        assert_eq!(first.relative_cases, 1.5);
        assert_eq!(first.expected_lowerbound, Some(1.0));
        assert_eq!(first.expected_upperbound, Some(2.0));
    }

    #[test]
    fn empty_and_nan_bounds_are_missing() {
        let ds = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.records[1].expected_lowerbound, None);
        assert_eq!(ds.records[1].expected_upperbound, None);
        assert_eq!(ds.records[2].expected_lowerbound, None);
        assert_eq!(ds.records[2].expected_upperbound, Some(4.0));
    }

    #[test]
    fn bound_columns_are_optional() {
        let csv = "date,syndrome,age_group,relative_cases\n2023-01-01,SARI,0-4,1.0\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].expected_upperbound, None);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "date,syndrome,relative_cases\n2023-01-01,SARI,1.0\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::MissingColumn("age_group"))
        ));
    }

    #[test]
    fn bad_date_names_the_row() {
        let csv = "date,syndrome,age_group,relative_cases\n2023-01-01,SARI,0-4,1.0\n01.02.2023,SARI,0-4,1.0\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::InvalidValue { row: 1, column: "date", .. })
        ));
    }

    #[test]
    fn empty_cases_are_rejected() {
        let csv = "date,syndrome,age_group,relative_cases\n2023-01-01,SARI,0-4,\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::MissingValue { row: 0, column: "relative_cases" })
        ));
    }

    #[test]
    fn json_records_are_parsed() {
        let json = r#"[
            {"date": "2023-01-01", "syndrome": "SARI", "age_group": "0-4",
             "relative_cases": 1.0, "expected_lowerbound": null, "expected_upperbound": 2.0},
            {"date": "2023-01-02", "syndrome": "ARI", "age_group": "5-9", "relative_cases": 2.5}
        ]"#;
        let ds = read_json(json).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].expected_lowerbound, None);
        assert_eq!(ds.records[0].expected_upperbound, Some(2.0));
        assert_eq!(ds.records[1].relative_cases, 2.5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_file(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("exist.csv"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("data.xlsx")).is_err());
    }
    #[test]
    fn padded_headers_are_trimmed() {
        let csv = " date , syndrome,age_group ,relative_cases\n2023-01-01,SARI,0-4,1.0\n";
        let ds = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].syndrome, "SARI");
        assert_eq!(ds.records[0].relative_cases, 1.0);
    }

    // -- Parquet --

    fn write_parquet(name: &str, columns: Vec<(&str, ArrayRef)>) -> PathBuf {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let path = std::env::temp_dir().join(format!(
            "surveillance-{}-{name}.parquet",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn days(date: &str) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap() - epoch).num_days() as i32
    }

    fn arr(array: impl Array + 'static) -> ArrayRef {
        Arc::new(array)
    }

    fn strings(values: &[&str]) -> ArrayRef {
        arr(StringArray::from(values.to_vec()))
    }

    #[test]
    fn parquet_date32_rows_are_parsed() {
        let path = write_parquet(
            "date32",
            vec![
                ("date", arr(Date32Array::from(vec![days("2023-01-01"), days("2023-01-02")]))),
                ("syndrome", strings(&["SARI", "ILI"])),
                ("age_group", strings(&["0-4", "00+"])),
                ("relative_cases", arr(Float64Array::from(vec![1.5, 0.25]))),
                ("expected_lowerbound", arr(Float64Array::from(vec![Some(1.0), None]))),
                ("expected_upperbound", arr(Float64Array::from(vec![Some(2.0), Some(f64::NAN)]))),
            ],
        );
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.syndromes, vec!["SARI", "ILI"]);
        let first = &ds.records[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(first.relative_cases, 1.5);
        assert_eq!(first.expected_lowerbound, Some(1.0));
        assert_eq!(first.expected_upperbound, Some(2.0));

        let second = &ds.records[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(second.expected_lowerbound, None);
        assert_eq!(second.expected_upperbound, None);
    }

    #[test]
    fn parquet_without_bound_columns_loads_missing_bounds() {
        let path = write_parquet(
            "no-bounds",
            vec![
                ("date", strings(&["2023-01-01"])),
                ("syndrome", strings(&["ARI"])),
                ("age_group", strings(&["5-9"])),
                ("relative_cases", arr(Int64Array::from(vec![3]))),
            ],
        );
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let rec = &ds.records[0];
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(rec.relative_cases, 3.0);
        assert_eq!(rec.expected_lowerbound, None);
        assert_eq!(rec.expected_upperbound, None);
    }

    #[test]
    fn parquet_timestamps_are_truncated_to_the_day() {
        let noon = NaiveDate::from_ymd_opt(2023, 3, 5)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let path = write_parquet(
            "timestamp",
            vec![
                ("date", arr(TimestampMillisecondArray::from(vec![noon]))),
                ("syndrome", strings(&["SARI"])),
                ("age_group", strings(&["80+"])),
                ("relative_cases", arr(Float32Array::from(vec![0.5f32]))),
            ],
        );
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2023, 3, 5).unwrap());
        assert_eq!(ds.records[0].relative_cases, 0.5);
    }

    #[test]
    fn parquet_bad_date_names_file_row_across_batches() {
        let n = 3000;
        let mut dates = vec!["2023-01-01"; n];
        dates[2500] = "bad";
        let path = write_parquet(
            "bad-date",
            vec![
                ("date", strings(&dates)),
                ("syndrome", strings(&vec!["SARI"; n])),
                ("age_group", strings(&vec!["0-4"; n])),
                ("relative_cases", arr(Float64Array::from(vec![1.0; n]))),
            ],
        );
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::InvalidValue { row: 2500, column: "date", .. })
        ));
    }

    #[test]
    fn parquet_unsupported_column_type_is_reported() {
        let path = write_parquet(
            "unsupported",
            vec![
                ("date", strings(&["2023-01-01"])),
                ("syndrome", strings(&["SARI"])),
                ("age_group", strings(&["0-4"])),
                ("relative_cases", strings(&["many"])),
            ],
        );
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        match err.downcast_ref::<SchemaError>() {
            Some(SchemaError::UnsupportedType { column, .. }) => assert_eq!(column, "relative_cases"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parquet_missing_required_column_is_reported() {
        let path = write_parquet(
            "missing-column",
            vec![
                ("date", strings(&["2023-01-01"])),
                ("syndrome", strings(&["SARI"])),
                ("relative_cases", arr(Float64Array::from(vec![1.0]))),
            ],
        );
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::MissingColumn("age_group"))
        ));
    }
}
