use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter::{distinct_values, filtered_indices, ColumnFilters};
use crate::data::loader::{load_cells, LoadError};
use crate::data::model::{CellField, CellSpec, PageData};
use crate::data::store::CellStore;

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: CellField,
    pub ascending: bool,
}

/// Header checkbox state for the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    None,
    Some,
    All,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where cells are read from (None until configured or a file is opened).
    pub store: Option<Arc<dyn CellStore>>,

    /// Table name passed to the store.
    pub table: String,

    /// Rows of the last successful load, in store order.
    pub cells: Vec<CellSpec>,

    /// Per-column filter criteria.
    pub filters: ColumnFilters,

    /// Active sort column, if any.
    pub sorting: Option<SortState>,

    /// Selected record ids.
    pub selected: BTreeSet<i64>,

    /// Data columns the user has hidden.
    pub hidden_columns: BTreeSet<CellField>,

    /// Indices into `cells` after filtering and sorting (cached).
    pub visible_rows: Vec<usize>,

    /// Dropdown entries for exact-match columns.
    pub distinct: BTreeMap<CellField, BTreeSet<String>>,

    /// Colours for the chemistry column.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a load is in progress.
    pub loading: bool,

    pending: Option<Receiver<Result<PageData, LoadError>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            store: None,
            table: "cells".to_string(),
            cells: Vec::new(),
            filters: ColumnFilters::default(),
            sorting: None,
            selected: BTreeSet::new(),
            hidden_columns: BTreeSet::new(),
            visible_rows: Vec::new(),
            distinct: BTreeMap::new(),
            color_map: None,
            status_message: None,
            loading: false,
            pending: None,
        }
    }
}

impl AppState {
    pub fn with_store(store: Arc<dyn CellStore>, table: impl Into<String>) -> Self {
        Self {
            store: Some(store),
            table: table.into(),
            ..Default::default()
        }
    }

    // -- loading --

    /// Replace the store and load from it. A load still running against the
    /// previous store is abandoned.
    pub fn set_store(&mut self, store: Arc<dyn CellStore>) {
        self.store = Some(store);
        self.pending = None;
        self.loading = false;
        self.start_load();
    }

    /// Run one load on a background thread. Ignored while a load is running.
    pub fn start_load(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if self.loading {
            return;
        }
        let table = self.table.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // Receiver may be gone if the window closed mid-load.
            let _ = tx.send(load_cells(store.as_ref(), &table));
        });
        self.pending = Some(rx);
        self.loading = true;
        self.status_message = None;
    }

    /// Pick up a finished load. Returns true when state changed.
    pub fn poll_load(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(LoadError {
                status: 500,
                message: crate::data::loader::LOAD_FAILED_MESSAGE,
            }),
        };
        self.pending = None;
        match result {
            Ok(page) => self.set_page(page),
            Err(e) => self.set_load_error(&e),
        }
        true
    }

    /// Ingest a freshly loaded page, keeping filters, sorting and hidden
    /// columns. Selection is cleared.
    pub fn set_page(&mut self, page: PageData) {
        self.cells = page.cells;
        self.selected.clear();
        self.distinct = distinct_values(&self.cells);
        self.color_map = self
            .distinct
            .get(&CellField::Chemistry)
            .map(|vals| ColorMap::new(CellField::Chemistry, vals));
        self.refresh_view();
        self.status_message = None;
        self.loading = false;
    }

    /// A failed load keeps whatever was shown before.
    pub fn set_load_error(&mut self, err: &LoadError) {
        self.status_message = Some(format!("Error {}: {}", err.status, err.message));
        self.loading = false;
    }

    // -- view --

    /// Recompute `visible_rows` after a filter, sort or data change.
    pub fn refresh_view(&mut self) {
        let mut rows = filtered_indices(&self.cells, &self.filters);
        if let Some(sort) = self.sorting {
            let cells = &self.cells;
            rows.sort_by(|&a, &b| {
                let va = cells[a].get(sort.field);
                let vb = cells[b].get(sort.field);
                let ord = va.compare(&vb, true);
                if sort.ascending || va.is_null() || vb.is_null() {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        self.visible_rows = rows;
    }

    /// Header click: ascending → descending → unsorted.
    pub fn toggle_sort(&mut self, field: CellField) {
        self.sorting = match self.sorting {
            Some(s) if s.field == field && s.ascending => Some(SortState {
                field,
                ascending: false,
            }),
            Some(s) if s.field == field => None,
            _ => Some(SortState {
                field,
                ascending: true,
            }),
        };
        self.refresh_view();
    }

    pub fn visible_cells(&self) -> impl Iterator<Item = &CellSpec> + '_ {
        self.visible_rows.iter().map(move |&i| &self.cells[i])
    }

    pub fn is_column_visible(&self, field: CellField) -> bool {
        !self.hidden_columns.contains(&field)
    }

    pub fn set_column_visible(&mut self, field: CellField, visible: bool) {
        if visible {
            self.hidden_columns.remove(&field);
        } else {
            self.hidden_columns.insert(field);
        }
    }

    // -- selection --

    pub fn toggle_row(&mut self, id: i64) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select or clear every visible row.
    pub fn select_all_visible(&mut self, selected: bool) {
        let ids: Vec<i64> = self.visible_cells().map(|c| c.id).collect();
        for id in ids {
            if selected {
                self.selected.insert(id);
            } else {
                self.selected.remove(&id);
            }
        }
    }

    pub fn visible_selection(&self) -> Selection {
        let total = self.visible_rows.len();
        let picked = self
            .visible_cells()
            .filter(|c| self.selected.contains(&c.id))
            .count();
        match picked {
            0 => Selection::None,
            n if n == total => Selection::All,
            _ => Selection::Some,
        }
    }

    /// Selected visible rows, or every visible row when none is selected.
    pub fn export_rows(&self) -> Vec<&CellSpec> {
        let selected: Vec<&CellSpec> = self
            .visible_cells()
            .filter(|c| self.selected.contains(&c.id))
            .collect();
        if selected.is_empty() {
            self.visible_cells().collect()
        } else {
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::data::filter::RangeCriterion;
    use crate::data::store::{CellQuery, StoreError};

    fn cell(id: i64, manufacturer: &str, capacity: Option<f64>) -> CellSpec {
        CellSpec {
            id,
            manufacturer: Some(manufacturer.into()),
            capacity_ah: capacity,
            chemistry: Some(if id % 2 == 0 { "NMC" } else { "LFP" }.into()),
            ..Default::default()
        }
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_page(PageData {
            cells: vec![
                cell(1, "EVE", Some(105.0)),
                cell(2, "molicel", None),
                cell(3, "Samsung", Some(5.0)),
                cell(4, "BAK", Some(4.0)),
            ],
        });
        state
    }

    fn visible_ids(state: &AppState) -> Vec<i64> {
        state.visible_cells().map(|c| c.id).collect()
    }

    #[test]
    fn set_page_shows_all_rows_in_store_order() {
        let state = loaded();
        assert_eq!(visible_ids(&state), vec![1, 2, 3, 4]);
        assert_eq!(state.distinct[&CellField::Chemistry].len(), 2);
        assert!(state.color_map.is_some());
        assert!(!state.loading);
    }

    #[test]
    fn sort_cycles_and_keeps_nulls_last() {
        let mut state = loaded();
        state.toggle_sort(CellField::CapacityAh);
        assert_eq!(visible_ids(&state), vec![4, 3, 1, 2]);
        state.toggle_sort(CellField::CapacityAh);
        assert_eq!(visible_ids(&state), vec![1, 3, 4, 2]);
        state.toggle_sort(CellField::CapacityAh);
        assert_eq!(state.sorting, None);
        assert_eq!(visible_ids(&state), vec![1, 2, 3, 4]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let mut state = loaded();
        state.toggle_sort(CellField::Manufacturer);
        assert_eq!(visible_ids(&state), vec![4, 1, 2, 3]);
    }

    #[test]
    fn filters_and_sort_compose() {
        let mut state = loaded();
        state
            .filters
            .set_range(
                CellField::CapacityAh,
                RangeCriterion {
                    min: Some("4,5".into()),
                    max: None,
                },
            );
        state.toggle_sort(CellField::CapacityAh);
        assert_eq!(visible_ids(&state), vec![3, 1]);
    }

    #[test]
    fn header_checkbox_tracks_visible_rows() {
        let mut state = loaded();
        assert_eq!(state.visible_selection(), Selection::None);
        state.toggle_row(3);
        assert_eq!(state.visible_selection(), Selection::Some);
        state.select_all_visible(true);
        assert_eq!(state.visible_selection(), Selection::All);

        state.filters.set_text(CellField::Chemistry, "nmc".into());
        state.refresh_view();
        state.select_all_visible(false);
        assert_eq!(state.visible_selection(), Selection::None);
        assert_eq!(state.selected, BTreeSet::from([1, 3]));
    }

    #[test]
    fn export_prefers_selection() {
        let mut state = loaded();
        assert_eq!(state.export_rows().len(), 4);
        state.toggle_row(2);
        state.toggle_row(4);
        let ids: Vec<i64> = state.export_rows().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 4]);
        state.toggle_row(2);
        assert_eq!(state.export_rows().len(), 1);
    }

    #[test]
    fn hidden_columns_toggle() {
        let mut state = loaded();
        state.set_column_visible(CellField::MassG, false);
        assert!(!state.is_column_visible(CellField::MassG));
        state.set_column_visible(CellField::MassG, true);
        assert!(state.is_column_visible(CellField::MassG));
    }

    #[test]
    fn load_error_keeps_previous_rows() {
        let mut state = loaded();
        state.set_load_error(&LoadError {
            status: 500,
            message: crate::data::loader::LOAD_FAILED_MESSAGE,
        });
        assert_eq!(state.cells.len(), 4);
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error 500: Fehler beim Laden der Zellen aus der Datenbank")
        );
    }

    struct FailingStore;

    impl CellStore for FailingStore {
        fn fetch_cells(&self, _: &CellQuery) -> Result<Option<Vec<CellSpec>>, StoreError> {
            Err(StoreError::Network("timed out".into()))
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    fn wait_for_load(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !state.poll_load() {
            assert!(Instant::now() < deadline, "load did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn background_load_reports_failure() {
        let mut state = AppState::with_store(Arc::new(FailingStore), "cells");
        state.start_load();
        assert!(state.loading);
        wait_for_load(&mut state);
        assert!(!state.loading);
        assert!(state.status_message.unwrap().contains("500"));
    }

    #[test]
    fn start_load_without_store_is_noop() {
        let mut state = AppState::default();
        state.start_load();
        assert!(!state.loading);
        assert!(!state.poll_load());
    }
}
