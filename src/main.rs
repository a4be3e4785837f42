mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::SueloApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional dataset path on the command line; a bad file is fatal since
    // the dashboard is useless without its data.
    let dataset = std::env::args().nth(1).map(|arg| {
        let path = PathBuf::from(&arg);
        match data::loader::load_file(&path) {
            Ok(ds) => {
                log::info!(
                    "Loaded {} observations from {}",
                    ds.len(),
                    path.display()
                );
                ds
            }
            Err(e) => {
                eprintln!("error: failed to load {}: {e:#}", path.display());
                std::process::exit(1);
            }
        }
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Suelo – Land Surface Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(SueloApp::new(dataset)))),
    )
}
