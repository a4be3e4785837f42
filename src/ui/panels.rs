use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::Variable;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection controls
// ---------------------------------------------------------------------------

/// Render the left controls panel: variable, provinces, date range.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the closures.
    let provinces = dataset.provinces.clone();
    let time_range = dataset.time_range;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Variable selector ----
            ui.strong("Variable");
            let current = state.selection.variable;
            egui::ComboBox::from_id_salt("variable")
                .selected_text(current.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for var in Variable::ALL {
                        if ui.selectable_label(current == var, var.label()).clicked() {
                            state.set_variable(var);
                        }
                    }
                });
            ui.separator();

            // ---- Province filter ----
            let n_selected = state.selection.provinces.len();
            let header_text = if n_selected == 0 {
                format!("Provinces  (all {})", provinces.len())
            } else {
                format!("Provinces  ({n_selected}/{})", provinces.len())
            };

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("provinces")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_provinces();
                        }
                        if ui.small_button("Clear").clicked() {
                            state.clear_provinces();
                        }
                    });
                    ui.small("No checked province means no region filter.");

                    for province in &provinces {
                        let mut checked = state.selection.provinces.contains(province);
                        if ui.checkbox(&mut checked, province).changed() {
                            state.toggle_province(province);
                        }
                    }
                });
            ui.separator();

            // ---- Date range ----
            ui.strong("Date range");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("From");
                ui.add(DatePickerButton::new(&mut state.selection.date_start).id_salt("date_start"));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("To");
                ui.add(DatePickerButton::new(&mut state.selection.date_end).id_salt("date_end"));
            });
            if let Some((start, end)) = time_range {
                ui.small(format!("Data covers {start} to {end}"));
                if ui.small_button("Full range").clicked() {
                    state.reset_date_range();
                }
            }
        });

    // Recompute visible indices after any control changes.
    state.refilter();
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} observations loaded, {} in selection",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open observation data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} observations across {} provinces",
                    dataset.len(),
                    dataset.provinces.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}
