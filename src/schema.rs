use std::collections::HashSet;

use polars::prelude::DataFrame;

use crate::error::{PhewasError, Result};

/// Columns a table must carry before it is processed.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: String,
    pub required: Vec<String>,
}

impl TableSchema {
    pub fn new<S: AsRef<str>>(table: &str, required: &[S]) -> Self {
        Self {
            table: table.to_string(),
            required: unique_in_order(required.iter().map(|s| s.as_ref().to_string())),
        }
    }

    /// Fails with [`PhewasError::MissingColumn`] naming the first absent column.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let present: HashSet<String> = column_names(df).into_iter().collect();
        for col in &self.required {
            if !present.contains(col) {
                return Err(PhewasError::MissingColumn(format!(
                    "{col} (in {} table)",
                    self.table
                )));
            }
        }
        Ok(())
    }
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Drops repeated names while keeping first-seen order.
pub fn unique_in_order<I: IntoIterator<Item = String>>(names: I) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
