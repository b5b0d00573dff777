use std::path::PathBuf;

use polars::prelude::DataFrame;

/// Name of the derived significance column appended by preparation.
pub const NEG_LOG10_P: &str = "-log10(p-value)";

/// Sentinel dropdown option that disables the filter.
pub const ALL_OPTION: &str = "All";

/// Where a table comes from: already in memory, or on disk.
#[derive(Debug, Clone)]
pub enum TableSource {
    Frame(DataFrame),
    Path(PathBuf),
}

impl From<DataFrame> for TableSource {
    fn from(df: DataFrame) -> Self {
        TableSource::Frame(df)
    }
}

impl From<PathBuf> for TableSource {
    fn from(path: PathBuf) -> Self {
        TableSource::Path(path)
    }
}

impl From<&str> for TableSource {
    fn from(path: &str) -> Self {
        TableSource::Path(PathBuf::from(path))
    }
}

/// Enrichment results joined with trait metadata, ready for plotting.
///
/// Rows are deduplicated, sorted by (category, p-value) and carry the
/// [`NEG_LOG10_P`] column.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub df: DataFrame,
}

impl PreparedTable {
    pub fn height(&self) -> usize {
        self.df.height()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Value(String),
}

impl Selection {
    pub fn from_option(option: &str) -> Self {
        if option == ALL_OPTION {
            Selection::All
        } else {
            Selection::Value(option.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::All => ALL_OPTION,
            Selection::Value(v) => v,
        }
    }
}
