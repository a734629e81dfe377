use thiserror::Error;

/// Failures that stop a whole run before any catchment is processed.
#[derive(Debug, Error)]
pub enum TcError {
    /// A required column/attribute could not be mapped on the input.
    #[error("required field '{field}' not found in {input_name}")]
    MissingField { field: String, input_name: String },

    /// The input layer or table has no usable rows.
    #[error("no records found in {0}")]
    EmptyInput(String),

    /// The elevation raster is unusable (no cells, bad cell size, wrong value count).
    #[error("invalid elevation raster: {0}")]
    InvalidRaster(String),

    /// Input pushed to a session that is in a different acquisition mode.
    #[error("acquisition mode is {actual} but input belongs to {expected}")]
    ModeMismatch { expected: String, actual: String },

    /// Two inputs claim the same catchment id.
    #[error("catchment id '{0}' appears more than once")]
    DuplicateId(String),

    /// A field was present but could not be parsed.
    #[error("could not parse '{value}' for field '{field}' on row {row}")]
    InvalidValue { field: String, value: String, row: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TcError>;
