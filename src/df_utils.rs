use std::collections::HashSet;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::error::PhewasError;

pub fn ensure_utf8(mut df: DataFrame, cols: &[&str]) -> Result<DataFrame> {
    for col in cols {
        if let Ok(column) = df.column(col)
            && column.dtype() != &DataType::String
        {
            let mut casted = column.as_materialized_series().cast(&DataType::String)?;
            casted.rename((*col).into());
            df.with_column::<Column>(casted.into())?;
        }
    }
    Ok(df)
}

pub fn ensure_f64(mut df: DataFrame, cols: &[&str]) -> Result<DataFrame> {
    for col in cols {
        if let Ok(column) = df.column(col)
            && column.dtype() != &DataType::Float64
        {
            let mut casted = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .with_context(|| format!("cast {col} to f64"))?;
            casted.rename((*col).into());
            df.with_column::<Column>(casted.into())?;
        }
    }
    Ok(df)
}

/// Replaces every exact-zero p-value with the smallest strictly positive
/// p-value in the column. Returns the frame and the number of replaced cells.
pub fn replace_zero_pvalues(mut df: DataFrame, p_col: &str) -> Result<(DataFrame, usize)> {
    let pvals = df.column(p_col)?.as_materialized_series().f64()?;
    let zeros = pvals.into_iter().filter(|p| *p == Some(0.0)).count();
    if zeros == 0 {
        return Ok((df, 0));
    }

    let min_positive = pvals
        .into_iter()
        .flatten()
        .filter(|p| *p > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !min_positive.is_finite() {
        return Err(PhewasError::NoPositivePValue(p_col.to_string()).into());
    }

    let replaced: Float64Chunked = pvals
        .into_iter()
        .map(|p| p.map(|v| if v == 0.0 { min_positive } else { v }))
        .collect();
    let mut series = replaced.into_series();
    series.rename(p_col.into());
    df.with_column::<Column>(series.into())?;
    Ok((df, zeros))
}

/// Appends `|-log10(p)|` as `out_col`. Null p-values stay null.
pub fn add_neg_log10(mut df: DataFrame, p_col: &str, out_col: &str) -> Result<DataFrame> {
    let pvals = df.column(p_col)?.as_materialized_series().f64()?;
    let scores: Float64Chunked = pvals
        .into_iter()
        .map(|p| p.map(|v| (-v.log10()).abs()))
        .collect();
    let mut series = scores.into_series();
    series.rename(out_col.into());
    df.with_column::<Column>(series.into())?;
    Ok(df)
}

/// Keeps rows whose `col`, rendered as text, equals `value`.
pub fn filter_equal(df: &DataFrame, col: &str, value: &str) -> Result<DataFrame> {
    let values = string_values(df, col)?;
    let mask: BooleanChunked = values
        .iter()
        .map(|v| v.as_deref() == Some(value))
        .collect();
    Ok(df.filter(&mask)?)
}

/// Non-null values of `col` as text, in first-appearance order.
pub fn distinct_values(df: &DataFrame, col: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    Ok(string_values(df, col)?
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(v.clone()))
        .collect())
}

pub fn string_values(df: &DataFrame, col: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(col)
        .with_context(|| format!("column {col}"))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

pub fn f64_values(df: &DataFrame, col: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(col)
        .with_context(|| format!("column {col}"))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}
