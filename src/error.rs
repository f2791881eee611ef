// src/error.rs

/// Failures raised while indexing, allocating or writing.
///
/// None of these are transient: they all mean the input data does not
/// cover the iteration space cleanly, so the run aborts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed number in {field}: {value:?}")]
    MalformedNumber { field: String, value: String },

    #[error("zero total waste in {table} for {key}")]
    ZeroTotal { table: &'static str, key: String },

    #[error("missing key in {table}: {key}")]
    MissingKey { table: &'static str, key: String },

    #[error("duplicate key in {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, Error>;
