use anyhow::{Context, Result};
use plotly::Plot;
use std::fs;
use std::path::{Path, PathBuf};

pub fn ensure_plots_dir() -> Result<PathBuf> {
    let dir = PathBuf::from("Plots");
    fs::create_dir_all(&dir).context("create Plots directory")?;
    Ok(dir)
}

pub fn plot_path(prefix: Option<&str>, name: &str) -> PathBuf {
    let file_name = match prefix {
        Some(pfx) => format!("{pfx}_{name}.html"),
        None => format!("{name}.html"),
    };
    PathBuf::from("Plots").join(file_name)
}

/// Creates the parent directory of an explicit output path.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// Writes `plot` as a standalone HTML page, creating missing parent folders.
pub fn write_plot_html(plot: &Plot, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, plot.to_html()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// File-name-safe rendering of a dropdown option.
pub fn slug(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
