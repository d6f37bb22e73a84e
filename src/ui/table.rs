use eframe::egui::{self, Align, Layout, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::columns::{ColumnDef, COLUMNS};
use crate::data::model::{CellField, FieldValue};
use crate::state::{AppState, Selection};

const ROW_HEIGHT: f32 = 20.0;

/// Clicks collected while drawing, applied once the table is done.
#[derive(Default)]
struct TableActions {
    sort: Option<CellField>,
    select_all: Option<bool>,
    toggled: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Cell table (central panel)
// ---------------------------------------------------------------------------

pub fn cell_table(ui: &mut Ui, state: &mut AppState) {
    if state.cells.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.loading {
                ui.spinner();
            } else if state.store.is_none() {
                ui.heading("Open a cell table export  (File → Open…)");
            } else {
                ui.heading("No cells.");
            }
        });
        return;
    }

    let columns: Vec<&ColumnDef> = COLUMNS
        .iter()
        .filter(|c| state.is_column_visible(c.field))
        .collect();
    let selection = state.visible_selection();
    let mut actions = TableActions::default();

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        let mut table = TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .min_scrolled_height(0.0)
            .column(Column::exact(24.0));
        for col in &columns {
            let min_width = if col.align_right() { 70.0 } else { 90.0 };
            table = table.column(Column::auto().at_least(min_width).clip(true));
        }

        table
            .header(ROW_HEIGHT + 4.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    let mut all = selection == Selection::All;
                    let checkbox = egui::Checkbox::without_text(&mut all)
                        .indeterminate(selection == Selection::Some);
                    if ui.add(checkbox).on_hover_text("Select all").changed() {
                        actions.select_all = Some(all);
                    }
                });
                for col in &columns {
                    header.col(|ui: &mut Ui| {
                        if header_label(ui, state, col).clicked() {
                            actions.sort = Some(col.field);
                        }
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, state.visible_rows.len(), |mut row| {
                    let cell = &state.cells[state.visible_rows[row.index()]];
                    row.col(|ui: &mut Ui| {
                        let mut checked = state.selected.contains(&cell.id);
                        if ui
                            .add(egui::Checkbox::without_text(&mut checked))
                            .on_hover_text("Select row")
                            .changed()
                        {
                            actions.toggled.push(cell.id);
                        }
                    });
                    for col in &columns {
                        row.col(|ui: &mut Ui| {
                            let value = cell.get(col.field);
                            let mut text = RichText::new(col.render(value));
                            if col.field == CellField::Model {
                                text = text.strong();
                            }
                            if let (FieldValue::Text(s), Some(cm)) = (value, &state.color_map) {
                                if cm.column == col.field {
                                    text = text.color(cm.color_for(s));
                                }
                            }
                            if col.align_right() {
                                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                    ui.label(text);
                                });
                            } else {
                                ui.label(text);
                            }
                        });
                    }
                });
            });
    });

    apply(state, actions);
}

/// Sortable header: label plus direction arrow.
fn header_label(ui: &mut Ui, state: &AppState, col: &ColumnDef) -> egui::Response {
    let arrow = match state.sorting {
        Some(s) if s.field == col.field && s.ascending => " ⏶",
        Some(s) if s.field == col.field => " ⏷",
        _ => "",
    };
    let text = RichText::new(format!("{}{arrow}", col.header)).strong();
    let label = egui::Label::new(text).sense(Sense::click());
    let response = if col.align_right() {
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| ui.add(label))
            .inner
    } else {
        ui.add(label)
    };
    response.on_hover_text("Click to sort")
}

fn apply(state: &mut AppState, actions: TableActions) {
    if let Some(selected) = actions.select_all {
        state.select_all_visible(selected);
    }
    for id in actions.toggled {
        state.toggle_row(id);
    }
    if let Some(field) = actions.sort {
        state.toggle_sort(field);
    }
}
