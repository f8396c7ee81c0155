use std::io::Cursor;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Table, Value};

/// Cell texts read as missing: Pandas' default `na_values`.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from a file on disk. Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Table> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    load_upload(name, &bytes)
}

/// Parse uploaded bytes into a table.  Dispatch by the file name's extension.
///
/// Supported formats:
/// * `.csv`     – header row, column kinds inferred from content
/// * `.xlsx`    – first worksheet, first row is the header
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat Arrow schema
pub fn load_upload(file_name: &str, bytes: &[u8]) -> Result<Table> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(bytes),
        "xlsx" => load_xlsx(bytes),
        "json" => load_json(bytes),
        "parquet" | "pq" => load_parquet(bytes),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {file_name}"))?;

    log::info!(
        "Loaded {file_name}: {} rows, columns {:?}",
        table.len(),
        table.column_names()
    );
    Ok(table)
}

/// Turn per-column cell vectors into a table, inferring each column's kind.
fn build_table(headers: Vec<String>, cells: Vec<Vec<Value>>) -> Table {
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::infer(name, values))
        .collect();
    Table::new(columns)
}

fn header_name(raw: &str, idx: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("Unnamed: {idx}")
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h, i))
        .collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(guess_value_type(record.get(col_idx).unwrap_or("")));
        }
    }

    Ok(build_table(headers, cells))
}

fn guess_value_type(raw: &str) -> Value {
    let s = raw.trim();
    if NA_TOKENS.contains(&s) {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // Any other spelling of NaN is still a missing value.
        return if f.is_nan() { Value::Null } else { Value::Float(f) };
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

fn load_xlsx(bytes: &[u8]) -> Result<Table> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("opening xlsx workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(&cell.to_string(), i))
        .collect();

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(col_idx).map(xlsx_to_value).unwrap_or(Value::Null));
        }
    }

    Ok(build_table(headers, cells))
}

fn xlsx_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        // Excel stores every number as a float; integral ones read back as ints.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::Integer(*f as i64)
        }
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if NA_TOKENS.contains(&s.trim()) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(when) => Value::String(when.to_string()),
            // Durations keep their serial value.
            None => Value::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Empty | Data::Error(_) => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "species": "setosa", "petal_length": 1.4 },
///   ...
/// ]
/// ```
fn load_json(bytes: &[u8]) -> Result<Table> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut cells: Vec<Vec<Value>> = Vec::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for (key, val) in obj {
            let col_idx = match headers.iter().position(|h| h == key) {
                Some(idx) => idx,
                None => {
                    headers.push(key.clone());
                    cells.push(vec![Value::Null; i]);
                    headers.len() - 1
                }
            };
            cells[col_idx].push(json_to_value(val));
        }
        // Keys absent from this record are missing.
        for column in &mut cells {
            column.resize(i + 1, Value::Null);
        }
    }

    Ok(build_table(headers, cells))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with a flat schema.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(bytes: &[u8]) -> Result<Table> {
    let data = bytes::Bytes::copy_from_slice(bytes);
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(data).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in cells.iter_mut().enumerate() {
            let values = arrow_values(batch.column(col_idx))
                .with_context(|| format!("converting column {}", headers[col_idx]))?;
            column.extend(values);
        }
    }

    Ok(build_table(headers, cells))
}

/// Convert an Arrow column to cells. Integers and floats of any width are
/// widened to `i64` / `f64`; every other type is rendered as text.
fn arrow_values(col: &ArrayRef) -> Result<Vec<Value>> {
    let data_type = col.data_type();
    if data_type.is_integer() {
        let wide = cast(col, &DataType::Int64)?;
        let ints = wide
            .as_primitive_opt::<Int64Type>()
            .context("integer column did not widen to Int64")?;
        return Ok(ints
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Integer))
            .collect());
    }
    if data_type.is_floating() {
        let wide = cast(col, &DataType::Float64)?;
        let floats = wide
            .as_primitive_opt::<Float64Type>()
            .context("float column did not widen to Float64")?;
        return Ok(floats
            .iter()
            .map(|v| match v {
                Some(f) if !f.is_nan() => Value::Float(f),
                _ => Value::Null,
            })
            .collect());
    }
    if let Some(bools) = col.as_boolean_opt() {
        return Ok(bools
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Bool))
            .collect());
    }

    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(col.as_ref(), &options)?;
    Ok((0..col.len())
        .map(|row| {
            if col.is_null(row) {
                Value::Null
            } else {
                Value::String(formatter.value(row).to_string())
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{DictionaryArray, Float32Array, Int16Array, TimestampMillisecondArray};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::filter::{filtered_indices, FilterSpec};
    use crate::data::model::ColumnKind;
    use crate::data::stats::describe;

    #[test]
    fn csv_infers_column_kinds() {
        let csv = "id,score,name,flag\n1,2.5,ann,true\n2,3,bob,false\n3,,NA,\n";
        let t = load_upload("data.csv", csv.as_bytes()).unwrap();
        assert_eq!(t.len(), 3);
        let kinds: Vec<ColumnKind> = t.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Text,
                ColumnKind::Boolean
            ]
        );
        assert_eq!(t.cell(1, 1), &Value::Float(3.0));
        assert_eq!(t.cell(2, 1), &Value::Null);
        assert_eq!(t.cell(2, 2), &Value::Null);
        assert_eq!(t.cell(0, 0), &Value::Integer(1));
    }

    #[test]
    fn csv_extension_is_case_insensitive() {
        let t = load_upload("DATA.CSV", b"a\n1\n").unwrap();
        assert_eq!(t.column_names(), vec!["a"]);
    }

    #[test]
    fn csv_blank_headers_are_named() {
        let t = load_upload("x.csv", b",a\n0,1\n").unwrap();
        assert_eq!(t.column_names(), vec!["Unnamed: 0", "a"]);
    }

    #[test]
    fn json_records_fill_missing_keys() {
        let json = r#"[{"a": 1, "b": "x"}, {"b": "y", "c": true}]"#;
        let t = load_upload("rows.json", json.as_bytes()).unwrap();
        assert_eq!(t.column_names(), vec!["a", "b", "c"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(1, 0), &Value::Null);
        assert_eq!(t.cell(0, 2), &Value::Null);
        assert_eq!(t.cell(1, 2), &Value::Bool(true));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_upload("notes.txt", b"hello").unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn malformed_xlsx_is_an_error() {
        assert!(load_upload("book.xlsx", b"not a zip archive").is_err());
    }

    #[test]
    fn xlsx_integral_floats_read_as_integers() {
        assert_eq!(xlsx_to_value(&Data::Float(4.0)), Value::Integer(4));
        assert_eq!(xlsx_to_value(&Data::Float(4.5)), Value::Float(4.5));
        assert_eq!(xlsx_to_value(&Data::Empty), Value::Null);
        assert_eq!(xlsx_to_value(&Data::String("#N/A".into())), Value::Null);
    }

    #[test]
    fn xlsx_dates_read_as_text() {
        let date = Data::DateTime(ExcelDateTime::new(45296.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(xlsx_to_value(&date), Value::String("2024-01-05 00:00:00".into()));
        assert_eq!(
            xlsx_to_value(&Data::DateTimeIso("2024-01-05T10:30:00".into())),
            Value::String("2024-01-05T10:30:00".into())
        );
    }

    #[test]
    fn csv_duplicate_headers_keep_every_row_unfiltered() {
        let t = load_upload("d.csv", b"a,a,a.1\n1,5,10\n2,6,20\n").unwrap();
        assert_eq!(t.column_names(), vec!["a", "a.1", "a.1.1"]);
        assert_eq!(t.observed_range("a.1.1"), Some((10.0, 20.0)));
        let kept = filtered_indices(&t, &FilterSpec::permissive(&t)).unwrap();
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn csv_missing_value_spellings_stay_numeric() {
        let csv = "x\n1\n-nan\n2\n#N/A\n<NA>\nn/a\nNAN\n";
        let t = load_upload("x.csv", csv.as_bytes()).unwrap();
        let col = t.column("x").unwrap();
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(col.values.iter().filter(|v| v.is_null()).count(), 5);

        let summary = &describe(&t)[0];
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, Some(1.5));
        assert_eq!(summary.min, Some(1.0));

        let kept = filtered_indices(&t, &FilterSpec::permissive(&t)).unwrap();
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn parquet_widens_numbers_and_renders_other_types() {
        let batch = RecordBatch::try_from_iter(vec![
            ("small", Arc::new(Int16Array::from(vec![7, 8])) as ArrayRef),
            ("ratio", Arc::new(Float32Array::from(vec![0.5, f32::NAN])) as ArrayRef),
            (
                "grade",
                Arc::new(["low", "high"].into_iter().collect::<DictionaryArray<Int32Type>>())
                    as ArrayRef,
            ),
            (
                "seen",
                Arc::new(TimestampMillisecondArray::from(vec![
                    1_704_412_800_000,
                    1_704_499_200_000,
                ])) as ArrayRef,
            ),
        ])
        .unwrap();
        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let t = load_upload("t.parquet", &buf).unwrap();
        let small = t.column("small").unwrap();
        assert_eq!(small.kind, ColumnKind::Numeric);
        assert_eq!(small.values, vec![Value::Integer(7), Value::Integer(8)]);
        assert_eq!(t.column("ratio").unwrap().values, vec![Value::Float(0.5), Value::Null]);
        assert_eq!(
            t.column("grade").unwrap().values,
            vec![Value::String("low".into()), Value::String("high".into())]
        );
        let seen = t.column("seen").unwrap();
        assert_eq!(seen.kind, ColumnKind::Text);
        assert!(seen.values[0].to_string().starts_with("2024-01-05"));
        assert!(seen.values[1].to_string().starts_with("2024-01-06"));
    }
}
