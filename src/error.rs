use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhewasError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("no positive p-value in column {0} to replace zero p-values with")]
    NoPositivePValue(String),

    #[error("unknown selection {value:?}; options are {options:?}")]
    UnknownSelection { value: String, options: Vec<String> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhewasError>;
