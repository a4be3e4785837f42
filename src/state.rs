use crate::data::filter::{filtered_indices, Selection};
use crate::data::model::{Dataset, Variable};
use crate::data::view::ViewKind;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Current variable / province / date-range selection.
    pub selection: Selection,

    /// Active view tab.
    pub view: ViewKind,

    /// Indices of observations passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            selection: Selection::default(),
            view: ViewKind::Map,
            visible_indices: Vec::new(),
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and seed the default selection.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.selection = Selection::for_dataset(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
    }

    /// Recompute `visible_indices` after a selection change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.selection);
        }
    }

    /// Set the active variable.
    pub fn set_variable(&mut self, variable: Variable) {
        self.selection.variable = variable;
    }

    /// Toggle a province in the region filter.
    pub fn toggle_province(&mut self, province: &str) {
        if !self.selection.provinces.remove(province) {
            self.selection.provinces.insert(province.to_string());
        }
        self.refilter();
    }

    /// Select every province (equivalent to no filter, spelled out).
    pub fn select_all_provinces(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection.provinces = ds.provinces.iter().cloned().collect();
            self.refilter();
        }
    }

    /// Clear the region filter.
    pub fn clear_provinces(&mut self) {
        self.selection.provinces.clear();
        self.refilter();
    }

    /// Reset the date bounds to the dataset's observed range.
    pub fn reset_date_range(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection.reset_dates(ds);
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Measurements, Observation};
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let date = |d: u32| NaiveDate::from_ymd_opt(2021, 1, d).unwrap();
        Dataset::from_observations(vec![
            Observation {
                time: date(1),
                lat: 0.0,
                lon: 0.0,
                provincia: Some("Pichincha".into()),
                values: Measurements::default(),
            },
            Observation {
                time: date(2),
                lat: 0.0,
                lon: 0.0,
                provincia: Some("Guayas".into()),
                values: Measurements::default(),
            },
        ])
    }

    #[test]
    fn set_dataset_seeds_selection_and_shows_everything() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert!(state.selection.provinces.is_empty());
        assert_eq!(
            state.selection.date_start,
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
        );
    }

    #[test]
    fn toggling_a_province_narrows_then_restores() {
        let mut state = AppState::default();
        state.set_dataset(dataset());

        state.toggle_province("Guayas");
        assert_eq!(state.visible_indices, vec![1]);

        state.toggle_province("Guayas");
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn clear_provinces_is_no_filter() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.toggle_province("Pichincha");
        state.clear_provinces();
        assert_eq!(state.visible_indices, vec![0, 1]);
    }
}
