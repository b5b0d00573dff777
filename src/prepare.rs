use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use crate::df_utils::{add_neg_log10, ensure_f64, ensure_utf8, replace_zero_pvalues};
use crate::io::load_table;
use crate::schema::{TableSchema, unique_in_order};
use crate::types::{NEG_LOG10_P, PreparedTable, TableSource};

#[derive(Debug, Clone)]
pub struct PrepareConfig {
    /// Gene-set identifier in the enrichment table.
    pub enrichment_id_col: String,
    /// Column of the metadata table matched against `enrichment_id_col`.
    pub metadata_id_col: String,
    pub p_col: String,
    pub category_col: String,
    pub program_col: Option<String>,
    pub annotation_cols: Vec<String>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            enrichment_id_col: "Term".to_string(),
            metadata_id_col: "trait_efos".to_string(),
            p_col: "P-value".to_string(),
            category_col: "trait_category".to_string(),
            program_col: Some("program_name".to_string()),
            annotation_cols: vec![
                "trait_reported".to_string(),
                "Genes".to_string(),
                "study_id".to_string(),
                "pmid".to_string(),
            ],
        }
    }
}

impl PrepareConfig {
    /// Columns kept after the join, in output order.
    pub fn retained_columns(&self) -> Vec<String> {
        let mut cols = vec![
            self.enrichment_id_col.clone(),
            self.p_col.clone(),
            self.category_col.clone(),
        ];
        cols.extend(self.program_col.iter().cloned());
        cols.extend(self.annotation_cols.iter().cloned());
        unique_in_order(cols)
    }
}

/// Left-joins enrichment results onto trait metadata and derives the
/// significance score used on the plot's y axis.
///
/// The result keeps [`PrepareConfig::retained_columns`] plus
/// [`NEG_LOG10_P`], without duplicate rows, sorted ascending by
/// (category, p-value) with null categories last. Zero p-values are replaced
/// by the smallest positive p-value of the table before the log transform.
pub fn process_enrichment_data(
    enrichment: &TableSource,
    metadata: &TableSource,
    config: &PrepareConfig,
) -> Result<PreparedTable> {
    let enrichment = load_table(enrichment, "enrichment")?;
    let metadata = load_table(metadata, "metadata")?;
    info!(
        "Loaded {} enrichment rows and {} metadata rows",
        enrichment.height(),
        metadata.height()
    );

    TableSchema::new("enrichment", &[&config.enrichment_id_col, &config.p_col])
        .validate(&enrichment)?;
    TableSchema::new("metadata", &[&config.metadata_id_col]).validate(&metadata)?;

    let enrichment = ensure_utf8(enrichment, &[&config.enrichment_id_col])?;
    let enrichment = ensure_f64(enrichment, &[&config.p_col])?;
    let metadata = ensure_utf8(metadata, &[&config.metadata_id_col])?;

    let joined = enrichment
        .join(
            &metadata,
            [config.enrichment_id_col.as_str()],
            [config.metadata_id_col.as_str()],
            JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::KeepColumns),
            None,
        )
        .context("join enrichment onto metadata")?;
    info!("Joined table has {} rows", joined.height());

    let retained = config.retained_columns();
    TableSchema::new("joined", retained.as_slice()).validate(&joined)?;
    let selected = joined.select(retained)?;

    let before = selected.height();
    let deduped = selected
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()
        .context("drop duplicate rows")?;
    let removed = before.saturating_sub(deduped.height());
    if removed > 0 {
        info!("Removed {removed} duplicate rows");
    }

    let sorted = deduped.sort(
        [config.category_col.as_str(), config.p_col.as_str()],
        SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true),
    )?;

    let (replaced, zeros) = replace_zero_pvalues(sorted, &config.p_col)?;
    if zeros > 0 {
        warn!(
            "Replaced {zeros} zero p-values in {} with the smallest positive p-value",
            config.p_col
        );
    }

    let df = add_neg_log10(replaced, &config.p_col, NEG_LOG10_P)?;
    Ok(PreparedTable { df })
}
