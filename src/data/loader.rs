use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Int32Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Column, Dataset, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an enrollment dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet file with the schema columns below (recommended)
/// * `.json`    – records orientation: `[{ "AÑO": 2020, "REGION": ..., ... }, ...]`
/// * `.csv`     – header row with the schema columns
///
/// Required columns: AÑO, REGION, FINANCIAMIENTO, NIVEL, FACULTAD, CARRERA,
/// UNIVERSIDAD, MATRICULADOS.
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            load_csv(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Row schema shared by the CSV and JSON loaders
// ---------------------------------------------------------------------------

/// One source row, keyed by the file's Spanish headers. MATRICULADOS is
/// deserialized as `u64`, so negative counts are rejected at parse time.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "AÑO")]
    year: i32,
    #[serde(rename = "REGION")]
    region: String,
    #[serde(rename = "FINANCIAMIENTO")]
    funding: String,
    #[serde(rename = "NIVEL")]
    level: String,
    #[serde(rename = "FACULTAD")]
    faculty: String,
    #[serde(rename = "CARRERA")]
    program: String,
    #[serde(rename = "UNIVERSIDAD")]
    institution: String,
    #[serde(rename = "MATRICULADOS")]
    enrolled: u64,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record {
            year: raw.year,
            region: raw.region,
            funding: raw.funding,
            level: raw.level,
            faculty: raw.faculty,
            program: raw.program,
            institution: raw.institution,
            enrolled: raw.enrolled,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<RawRecord> = serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(Dataset::from_records(
        rows.into_iter().map(Record::from).collect(),
    ))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv<R: Read>(input: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);
    let mut records = Vec::new();

    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(Record::from(raw));
    }

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file with one column per schema field.
///
/// Integer columns may be Int32, Int64 or UInt64; text columns Utf8 or
/// LargeUtf8.  Works with files written by Pandas, Polars, and
/// `generate_sample`.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let years = column_by_header(&batch, Column::Year.header())?;
        let regions = column_by_header(&batch, Column::Region.header())?;
        let fundings = column_by_header(&batch, Column::Funding.header())?;
        let levels = column_by_header(&batch, Column::Level.header())?;
        let faculties = column_by_header(&batch, Column::Faculty.header())?;
        let programs = column_by_header(&batch, Column::Program.header())?;
        let institutions = column_by_header(&batch, Column::Institution.header())?;
        let enrolled = column_by_header(&batch, "MATRICULADOS")?;

        for row in 0..batch.num_rows() {
            let count = int_at(enrolled, row)
                .with_context(|| format!("Row {row}: failed to read 'MATRICULADOS'"))?;
            if count < 0 {
                bail!("Row {row}: MATRICULADOS is negative ({count})");
            }
            records.push(Record {
                year: int_at(years, row)
                    .with_context(|| format!("Row {row}: failed to read 'AÑO'"))?
                    as i32,
                region: string_at(regions, row)
                    .with_context(|| format!("Row {row}: failed to read 'REGION'"))?,
                funding: string_at(fundings, row)
                    .with_context(|| format!("Row {row}: failed to read 'FINANCIAMIENTO'"))?,
                level: string_at(levels, row)
                    .with_context(|| format!("Row {row}: failed to read 'NIVEL'"))?,
                faculty: string_at(faculties, row)
                    .with_context(|| format!("Row {row}: failed to read 'FACULTAD'"))?,
                program: string_at(programs, row)
                    .with_context(|| format!("Row {row}: failed to read 'CARRERA'"))?,
                institution: string_at(institutions, row)
                    .with_context(|| format!("Row {row}: failed to read 'UNIVERSIDAD'"))?,
                enrolled: count as u64,
            });
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn column_by_header<'a>(
    batch: &'a arrow::record_batch::RecordBatch,
    header: &str,
) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(header)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{header}' column"))?;
    Ok(batch.column(idx))
}

/// Extract an integer cell from an Int32, Int64 or UInt64 column.
fn int_at(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value in integer column");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row))
        }
        DataType::UInt64 => {
            let arr = col
                .as_any()
                .downcast_ref::<UInt64Array>()
                .context("expected UInt64Array")?;
            Ok(arr.value(row) as i64)
        }
        other => bail!("Expected integer column, got {other:?}"),
    }
}

/// Extract a text cell from a Utf8 or LargeUtf8 column.
fn string_at(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected string column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
AÑO,REGION,FINANCIAMIENTO,NIVEL,FACULTAD,CARRERA,UNIVERSIDAD,MATRICULADOS
2020,SIERRA,PARTICULAR,TERCER NIVEL,INGENIERIA,SISTEMAS,UNIVERSIDAD DE LAS AMERICAS,120
2021,COSTA,PUBLICA,TECNICO,TECNOLOGIA,REDES,INSTITUTO DEL PACIFICO,45
";

    #[test]
    fn csv_rows_map_onto_records() {
        let ds = load_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records[0];
        assert_eq!(first.year, 2020);
        assert_eq!(first.institution, "UNIVERSIDAD DE LAS AMERICAS");
        assert_eq!(first.enrolled, 120);

        let second = &ds.records[1];
        assert_eq!(second.level, "TECNICO");
        assert_eq!(second.program, "REDES");
    }

    #[test]
    fn negative_enrollment_is_rejected() {
        let csv = "\
AÑO,REGION,FINANCIAMIENTO,NIVEL,FACULTAD,CARRERA,UNIVERSIDAD,MATRICULADOS
2020,SIERRA,PARTICULAR,TERCER NIVEL,INGENIERIA,SISTEMAS,U1,-5
";
        assert!(load_csv(csv.as_bytes()).is_err());
    }
}
