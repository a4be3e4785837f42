use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Dataset, Variable};

// ---------------------------------------------------------------------------
// Selection – one render request's parameters
// ---------------------------------------------------------------------------

/// User-selected parameters for a single render.
///
/// An empty `provinces` set means "no region filter".  `date_start <=
/// date_end` is not enforced: a reversed range simply matches nothing and the
/// views come out empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub variable: Variable,
    pub provinces: BTreeSet<String>,
    /// Inclusive lower date bound.
    pub date_start: NaiveDate,
    /// Inclusive upper date bound.
    pub date_end: NaiveDate,
}

impl Default for Selection {
    fn default() -> Self {
        // Matches the source data's coverage; replaced by the observed range
        // as soon as a dataset is loaded.
        Selection {
            variable: Variable::SoilMoisture0_10,
            provinces: BTreeSet::new(),
            date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            date_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

impl Selection {
    /// Default selection for a freshly loaded dataset: first variable, no
    /// region filter, full observed date range.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        let mut selection = Selection::default();
        if let Some((start, end)) = dataset.time_range {
            selection.date_start = start;
            selection.date_end = end;
        }
        selection
    }

    /// Reset the date bounds to the dataset's observed range.
    pub fn reset_dates(&mut self, dataset: &Dataset) {
        if let Some((start, end)) = dataset.time_range {
            self.date_start = start;
            self.date_end = end;
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return indices of observations that pass the current selection.
///
/// An observation passes when:
/// * its `time` lies within `[date_start, date_end]` inclusive, and
/// * `provinces` is empty (no region filter), or its `provincia` is `Some`
///   and a member of the set.  A null `provincia` never matches a concrete
///   label.
pub fn filtered_indices(dataset: &Dataset, selection: &Selection) -> Vec<usize> {
    dataset
        .observations
        .iter()
        .enumerate()
        .filter(|(_, obs)| {
            if obs.time < selection.date_start || obs.time > selection.date_end {
                return false;
            }
            if selection.provinces.is_empty() {
                return true;
            }
            match &obs.provincia {
                Some(p) => selection.provinces.contains(p),
                None => false,
            }
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Measurements, Observation};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(time: NaiveDate, provincia: Option<&str>) -> Observation {
        Observation {
            time,
            lat: 0.0,
            lon: 0.0,
            provincia: provincia.map(str::to_string),
            values: Measurements::default(),
        }
    }

    fn sample() -> Dataset {
        Dataset::from_observations(vec![
            obs(date(2021, 1, 1), Some("Pichincha")),
            obs(date(2021, 1, 15), Some("Guayas")),
            obs(date(2021, 2, 1), None),
            obs(date(2021, 3, 1), Some("Pichincha")),
        ])
    }

    fn selection(start: NaiveDate, end: NaiveDate, provinces: &[&str]) -> Selection {
        Selection {
            variable: Variable::SoilMoisture0_10,
            provinces: provinces.iter().map(|p| p.to_string()).collect(),
            date_start: start,
            date_end: end,
        }
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let ds = sample();
        let sel = selection(date(2021, 1, 1), date(2021, 2, 1), &[]);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2]);
    }

    #[test]
    fn empty_province_set_applies_no_region_filter() {
        let ds = sample();
        let sel = selection(date(2020, 1, 1), date(2022, 1, 1), &[]);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 2, 3]);
    }

    #[test]
    fn province_filter_keeps_only_members() {
        let ds = sample();
        let sel = selection(date(2020, 1, 1), date(2022, 1, 1), &["Pichincha"]);
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 3]);
    }

    #[test]
    fn null_province_never_matches_an_active_filter() {
        let ds = sample();
        let sel = selection(date(2020, 1, 1), date(2022, 1, 1), &["Pichincha", "Guayas"]);
        // Index 2 has provincia = None and must be excluded.
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 1, 3]);
    }

    #[test]
    fn reversed_range_matches_nothing() {
        let ds = sample();
        let sel = selection(date(2021, 3, 1), date(2021, 1, 1), &[]);
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn for_dataset_seeds_the_observed_range() {
        let ds = sample();
        let sel = Selection::for_dataset(&ds);
        assert_eq!(sel.date_start, date(2021, 1, 1));
        assert_eq!(sel.date_end, date(2021, 3, 1));
        assert!(sel.provinces.is_empty());
    }
}
