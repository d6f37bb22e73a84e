use std::path::Path;

use anyhow::{Context, Result};

use super::model::CellSpec;

/// Write `cells` as CSV with the store's column names as header.
/// Absent values become empty fields. Returns the number of rows written.
pub fn export_csv<'a>(path: &Path, cells: impl IntoIterator<Item = &'a CellSpec>) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut written = 0;
    for cell in cells {
        writer
            .serialize(cell)
            .with_context(|| format!("writing cell {}", cell.id))?;
        written += 1;
    }
    writer.flush().context("flushing CSV")?;

    log::info!("Exported {written} cells to {}", path.display());
    Ok(written)
}
