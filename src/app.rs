use eframe::egui;

use crate::data::model::Dataset;
use crate::data::view::ViewKind;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SueloApp {
    pub state: AppState,
}

impl SueloApp {
    /// Start with an optional pre-loaded dataset (the CLI startup path).
    pub fn new(dataset: Option<Dataset>) -> Self {
        let mut state = AppState::default();
        if let Some(ds) = dataset {
            state.set_dataset(ds);
        }
        Self { state }
    }
}

impl eframe::App for SueloApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection controls ----
        egui::SidePanel::left("selection_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: view tabs + active view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for kind in ViewKind::ALL {
                    if ui
                        .selectable_label(self.state.view == kind, kind.label())
                        .clicked()
                    {
                        self.state.view = kind;
                    }
                }
            });
            ui.separator();

            plot::view_panel(ui, &self.state);
        });
    }
}
