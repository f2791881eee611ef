// src/output.rs

use arrow::{
    array::{ArrayRef, Float64Array, StringArray, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

use crate::{error::Result, model::OutputRecord};

pub const AMOUNT_COLUMN: &str = "approximateAmount";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    region: &'a str,
    year: u32,
    polymer: &'static str,
    fate: &'static str,
    #[serde(rename = "approximateAmount")]
    approximate_amount: f64,
}

/// Serialize records as CSV with a `region,year,polymer,fate,approximateAmount` header.
pub fn write_csv_to<W: Write>(writer: W, records: &[OutputRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(["region", "year", "polymer", "fate", AMOUNT_COLUMN])?;
    }
    for rec in records {
        wtr.serialize(CsvRow {
            region: &rec.region,
            year: rec.year,
            polymer: rec.polymer.label(),
            fate: rec.fate.label(),
            approximate_amount: rec.amount,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn output_schema() -> Schema {
    Schema::new(vec![
        Field::new("region", DataType::Utf8, false),
        Field::new("year", DataType::UInt32, false),
        Field::new("polymer", DataType::Utf8, false),
        Field::new("fate", DataType::Utf8, false),
        Field::new(AMOUNT_COLUMN, DataType::Float64, false),
    ])
}

/// Build a single Arrow batch holding every record, columns as in the CSV.
pub fn to_record_batch(records: &[OutputRecord]) -> Result<RecordBatch> {
    let region: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.region.as_str()),
    ));
    let year: ArrayRef = Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.year)));
    let polymer: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.polymer.label()),
    ));
    let fate: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.fate.label()),
    ));
    let amount: ArrayRef = Arc::new(Float64Array::from_iter_values(
        records.iter().map(|r| r.amount),
    ));
    Ok(RecordBatch::try_new(
        Arc::new(output_schema()),
        vec![region, year, polymer, fate, amount],
    )?)
}

fn write_parquet_to(file: File, records: &[OutputRecord]) -> Result<()> {
    let batch = to_record_batch(records)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Write `records` to `path`, going through a hidden temp file in the same
/// directory and renaming it over `path` once complete.
#[tracing::instrument(level = "info", skip(records), fields(path = %path.display(), records = records.len()))]
pub fn write_output(path: &Path, records: &[OutputRecord], format: OutputFormat) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let tmp_path = dir.join(format!(".{}.tmp", file_name));
    let tmp = File::create(&tmp_path)?;

    let written = match format {
        OutputFormat::Csv => write_csv_to(tmp, records),
        OutputFormat::Parquet => write_parquet_to(tmp, records),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    info!(?format, "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fate, Polymer};
    use anyhow::Result;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use tempfile::tempdir;

    fn records() -> Vec<OutputRecord> {
        vec![
            OutputRecord {
                region: "na".into(),
                year: 2020,
                polymer: Polymer::Ldpe,
                fate: Fate::Landfill,
                amount: 5.0,
            },
            OutputRecord {
                region: "na".into(),
                year: 2020,
                polymer: Polymer::OtherThermoplastics,
                fate: Fate::Recycling,
                amount: 0.25,
            },
        ]
    }

    #[test]
    fn csv_has_header_and_labels() -> Result<()> {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, &records())?;
        let text = String::from_utf8(buf)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "region,year,polymer,fate,approximateAmount");
        assert_eq!(lines[1], "na,2020,ldpe,eolLandfillMT,5.0");
        assert_eq!(lines[2], "na,2020,other thermoplastics,eolRecyclingMT,0.25");
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn empty_csv_still_has_header() -> Result<()> {
        let mut buf = Vec::new();
        write_csv_to(&mut buf, &[])?;
        assert_eq!(String::from_utf8(buf)?, "region,year,polymer,fate,approximateAmount\n");
        Ok(())
    }

    #[test]
    fn write_output_replaces_file_atomically() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("out.csv");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, "stale")?;

        write_output(&path, &records(), OutputFormat::Csv)?;
        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("region,year,polymer,fate,approximateAmount\n"));
        assert!(!path.parent().unwrap().join(".out.csv.tmp").exists());
        Ok(())
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() -> Result<()> {
        let dir = tempdir()?;
        let target = dir.path().join("out.csv");
        fs::create_dir(&target)?;
        fs::write(target.join("keep"), "occupied")?;

        assert!(write_output(&target, &records(), OutputFormat::Csv).is_err());
        assert!(!dir.path().join(".out.csv.tmp").exists());
        assert!(target.join("keep").exists());
        Ok(())
    }

    #[test]
    fn parquet_output_keeps_every_row() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.parquet");
        write_output(&path, &records(), OutputFormat::Parquet)?;

        let reader = SerializedFileReader::new(File::open(&path)?)?;
        assert_eq!(reader.metadata().file_metadata().num_rows(), 2);
        let schema = reader.metadata().file_metadata().schema_descr();
        assert_eq!(schema.num_columns(), 5);
        assert_eq!(schema.column(4).name(), AMOUNT_COLUMN);
        Ok(())
    }
}
