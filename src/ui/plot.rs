use chrono::{Duration, NaiveDate, NaiveDateTime};
use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};

use crate::color::ValueColorMap;
use crate::data::model::Variable;
use crate::data::view::{
    build_view, Histogram, MapPoint, SeriesPoint, ViewData, CLASSIFICATION_NOTE,
};
use crate::state::AppState;

/// Map markers are grouped into this many color bands; egui_plot draws one
/// `Points` geometry per band.
const MAP_COLOR_BANDS: usize = 24;

// ---------------------------------------------------------------------------
// Central panel – the active view
// ---------------------------------------------------------------------------

/// Render the active view in the central panel.
pub fn view_panel(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a dataset to get started  (File → Open…)");
        });
        return;
    };

    let variable = state.selection.variable;
    match build_view(dataset, &state.selection, state.view) {
        ViewData::Map(points) => map_plot(ui, &points, variable),
        ViewData::Series(points) => series_plot(ui, &points, variable),
        ViewData::Distribution(hist) => histogram_plot(ui, &hist, variable),
        ViewData::Classification => classification_panel(ui),
    }
}

// ---------------------------------------------------------------------------
// Map view
// ---------------------------------------------------------------------------

fn map_plot(ui: &mut Ui, points: &[MapPoint], variable: Variable) {
    let colormap = ValueColorMap::from_values(points.iter().map(|p| p.value));
    let domain = colormap.domain();

    // Bucket points into color bands; the extra last band collects
    // non-finite values drawn in the fallback color.
    let mut bands: Vec<Vec<[f64; 2]>> = vec![Vec::new(); MAP_COLOR_BANDS + 1];
    for p in points {
        let band = match domain {
            Some((min, max)) if p.value.is_finite() => {
                let t = ((p.value - min) / (max - min)).clamp(0.0, 1.0);
                ((t * MAP_COLOR_BANDS as f64) as usize).min(MAP_COLOR_BANDS - 1)
            }
            _ => MAP_COLOR_BANDS,
        };
        bands[band].push([p.lon, p.lat]);
    }

    let caption = match domain {
        Some((min, max)) => format!(
            "Color: {} ({}), {min:.4} to {max:.4}",
            variable.label(),
            variable.unit()
        ),
        None => format!("Color: {} ({})", variable.label(), variable.unit()),
    };
    ui.small(caption);

    Plot::new("map_plot")
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (band, coords) in bands.iter().enumerate() {
                if coords.is_empty() {
                    continue;
                }
                let color = match domain {
                    Some((min, max)) if band < MAP_COLOR_BANDS => {
                        let t = (band as f64 + 0.5) / MAP_COLOR_BANDS as f64;
                        colormap.color_for(min + t * (max - min))
                    }
                    _ => colormap.default_color(),
                };
                let markers = Points::new(PlotPoints::from(coords.clone()))
                    .color(color)
                    .radius(2.5);
                plot_ui.points(markers);
            }
        });
}

// ---------------------------------------------------------------------------
// Time-series view
// ---------------------------------------------------------------------------

fn series_plot(ui: &mut Ui, points: &[SeriesPoint], variable: Variable) {
    let coords: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [date_to_x(p.time), p.mean])
        .collect();

    Plot::new("series_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Date")
        .y_axis_label(format!("{} ({})", variable.label(), variable.unit()))
        .x_axis_formatter(|mark, _range| x_to_date(mark.value).to_string())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let line = Line::new(PlotPoints::from(coords.clone()))
                .name(variable.label())
                .width(1.5);
            plot_ui.line(line);

            let markers = Points::new(PlotPoints::from(coords)).radius(3.0);
            plot_ui.points(markers);
        });
}

// ---------------------------------------------------------------------------
// Distribution view
// ---------------------------------------------------------------------------

fn histogram_plot(ui: &mut Ui, hist: &Histogram, variable: Variable) {
    if hist.is_empty() {
        ui.small("No finite values in the current selection.");
    }

    // Width 0 would make degenerate (all-equal) histograms invisible.
    let width = if hist.bin_width() > 0.0 {
        hist.bin_width()
    } else {
        1.0
    };

    let bars: Vec<Bar> = hist
        .counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let center = hist.min + (i as f64 + 0.5) * hist.bin_width();
            Bar::new(center, count as f64).width(width)
        })
        .collect();

    Plot::new("distribution_plot")
        .x_axis_label(format!("{} ({})", variable.label(), variable.unit()))
        .y_axis_label("Count")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(variable.label()));
        });
}

// ---------------------------------------------------------------------------
// Classification placeholder
// ---------------------------------------------------------------------------

fn classification_panel(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(CLASSIFICATION_NOTE);
    });
}

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

fn unix_epoch() -> NaiveDate {
    NaiveDateTime::UNIX_EPOCH.date()
}

fn date_to_x(date: NaiveDate) -> f64 {
    (date - unix_epoch()).num_days() as f64
}

fn x_to_date(x: f64) -> NaiveDate {
    unix_epoch() + Duration::days(x.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_axis_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 15).unwrap();
        assert_eq!(x_to_date(date_to_x(date)), date);
        assert_eq!(date_to_x(unix_epoch()), 0.0);
    }
}
