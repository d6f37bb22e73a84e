use thiserror::Error;

use super::model::PageData;
use super::store::{CellQuery, CellStore};

/// Message shown to the user when the cell table cannot be read.
pub const LOAD_FAILED_MESSAGE: &str = "Fehler beim Laden der Zellen aus der Datenbank";

/// User-facing load failure. Carries no detail about the underlying store
/// error; that is only written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct LoadError {
    pub status: u16,
    pub message: &'static str,
}

impl LoadError {
    fn server_error() -> Self {
        Self {
            status: 500,
            message: LOAD_FAILED_MESSAGE,
        }
    }
}

/// Read every cell from `table`, ordered by manufacturer then model.
///
/// Exactly one query is issued. A store that answers without a row set
/// yields an empty page.
pub fn load_cells(store: &dyn CellStore, table: &str) -> Result<PageData, LoadError> {
    let query = CellQuery::cells(table);
    match store.fetch_cells(&query) {
        Ok(rows) => {
            let cells = rows.unwrap_or_default();
            log::info!("Loaded {} cells from {}", cells.len(), store.describe());
            Ok(PageData { cells })
        }
        Err(e) => {
            log::error!("Fehler beim Laden der Zellen: {e}");
            Err(LoadError::server_error())
        }
    }
}
