//! Joins gene-set enrichment results with trait metadata and renders
//! PheWAS-style scatter plots with a dropdown filter.

pub mod error;
pub mod logging;
pub mod types;

pub mod df_utils;
pub mod io;
pub mod plot_utils;
pub mod qc;
pub mod schema;

pub mod plot;
pub mod prepare;
