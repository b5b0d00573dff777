use std::path::Path;

use crate::error::{PhewasError, Result};

/// Recognized table file extensions, compressed variants included.
const TABLE_EXTENSIONS: [&str; 5] = ["csv", "tsv", "txt", "gz", "bz2"];

pub fn check_range_f64(value: f64, min: f64, max: f64, inclusive: bool, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(PhewasError::InvalidArgument(format!(
            "Value of {name} should be finite"
        )));
    }
    let below = if inclusive { value < min } else { value <= min };
    let above = if inclusive { value > max } else { value >= max };
    if below {
        return Err(PhewasError::InvalidArgument(format!(
            "Value of {name} should be above {min}"
        )));
    }
    if above {
        return Err(PhewasError::InvalidArgument(format!(
            "Value of {name} should be below {max}"
        )));
    }
    Ok(())
}

pub fn check_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(PhewasError::InvalidArgument(format!(
            "Value of {name} should be positive"
        )));
    }
    Ok(())
}

/// Accepts a path only if it names an existing file with a table extension.
pub fn check_table_path(path: &Path, name: &str) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !TABLE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PhewasError::InvalidInput(format!(
            "{name} must be a table or a path to a CSV/TSV file (optionally .gz/.bz2), got {path:?}"
        )));
    }
    if !path.is_file() {
        return Err(PhewasError::InvalidInput(format!(
            "File {path:?} passed to {name} does not exist"
        )));
    }
    Ok(())
}
