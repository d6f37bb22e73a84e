use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, Ui};

use crate::data::columns::{FilterKind, COLUMNS};
use crate::data::export::export_csv;
use crate::data::file_store::FileStore;
use crate::data::model::CellField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Visible rows are recomputed only when a
/// filter actually changed.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        if state.filters.is_empty() {
            ui.heading("Filters");
        } else {
            ui.heading(format!("Filters ({})", state.filters.len()));
        }
        if !state.filters.is_empty() && ui.small_button("Clear").clicked() {
            state.filters.clear_all();
            changed = true;
        }
    });
    ui.separator();

    if state.cells.is_empty() && !state.loading {
        ui.label("No cells loaded.");
        if changed {
            state.refresh_view();
        }
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &COLUMNS {
                let active = state.filters.get(col.field).is_some();
                let mut header = RichText::new(col.header).strong();
                if active {
                    header = header.color(ui.visuals().hyperlink_color);
                }

                changed |= egui::CollapsingHeader::new(header)
                    .id_salt(col.field)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| match col.filter {
                        FilterKind::EqualsString => equals_filter(ui, state, col.field),
                        FilterKind::IncludesString => includes_filter(ui, state, col.field),
                        FilterKind::InNumberRange => range_filter(ui, state, col.field),
                    })
                    .body_returned
                    .unwrap_or(false);
            }
        });

    if changed {
        state.refresh_view();
    }
}

fn equals_filter(ui: &mut Ui, state: &mut AppState, field: CellField) -> bool {
    let mut changed = false;
    let values = state.distinct.get(&field).cloned().unwrap_or_default();
    let current = state.filters.text(field).unwrap_or("").to_string();
    let current_folded = current.to_lowercase();
    let shown = if current.is_empty() { "(all)" } else { current.as_str() };

    egui::ComboBox::from_id_salt(("equals", field))
        .selected_text(shown)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_empty(), "(all)").clicked() {
                state.filters.clear(field);
                changed = true;
            }
            for value in &values {
                let mut text = RichText::new(value);
                if let Some(cm) = state.color_map.as_ref().filter(|cm| cm.column == field) {
                    text = text.color(cm.color_for(value));
                }
                if ui
                    .selectable_label(current_folded == value.to_lowercase(), text)
                    .clicked()
                {
                    state.filters.set_text(field, value.clone());
                    changed = true;
                }
            }
        });
    changed
}

fn includes_filter(ui: &mut Ui, state: &mut AppState, field: CellField) -> bool {
    let mut text = state.filters.text(field).unwrap_or("").to_string();
    let response = ui.add(TextEdit::singleline(&mut text).hint_text("contains…"));
    if response.changed() {
        state.filters.set_text(field, text);
    }
    response.changed()
}

fn range_filter(ui: &mut Ui, state: &mut AppState, field: CellField) -> bool {
    let mut range = state.filters.range(field).cloned().unwrap_or_default();
    let mut changed = false;
    ui.horizontal(|ui: &mut Ui| {
        let min = range.min.get_or_insert_with(String::new);
        changed |= ui
            .add(TextEdit::singleline(min).hint_text("min").desired_width(70.0))
            .changed();
        ui.label("–");
        let max = range.max.get_or_insert_with(String::new);
        changed |= ui
            .add(TextEdit::singleline(max).hint_text("max").desired_width(70.0))
            .changed();
    });
    if changed {
        state.filters.set_range(field, range);
    }
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.store.is_some() && !state.loading;
            if ui.add_enabled(can_reload, egui::Button::new("Reload")).clicked() {
                state.start_load();
                ui.close_menu();
            }
            let can_export = !state.visible_rows.is_empty();
            if ui
                .add_enabled(can_export, egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Columns", |ui: &mut Ui| {
            for col in &COLUMNS {
                let mut visible = state.is_column_visible(col.field);
                if ui.checkbox(&mut visible, col.header).changed() {
                    state.set_column_visible(col.field, visible);
                }
            }
        });

        ui.separator();

        if state.loading {
            ui.spinner();
            ui.label("Loading…");
        } else if let Some(store) = &state.store {
            ui.label(format!(
                "{} cells loaded, {} visible, {} selected",
                state.cells.len(),
                state.visible_rows.len(),
                state.selected.len()
            ));
            ui.separator();
            ui.weak(store.describe());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open cell table export")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.set_store(Arc::new(FileStore::new(path)));
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export cells")
        .add_filter("CSV", &["csv"])
        .set_file_name("cells.csv")
        .save_file();

    if let Some(path) = file {
        match export_csv(&path, state.export_rows()) {
            Ok(n) => {
                state.status_message = None;
                log::debug!("export of {n} rows finished");
            }
            Err(e) => {
                log::error!("Failed to export cells: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
