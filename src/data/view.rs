use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::filter::{filtered_indices, Selection};
use super::model::{Dataset, Variable};

/// Number of bins in the distribution view.
pub const HISTOGRAM_BINS: usize = 40;

/// Static text shown by the classification view.
pub const CLASSIFICATION_NOTE: &str =
    "Land-cover classification is not implemented yet.\n\
     A trained model and its decision tree will be shown here.";

// ---------------------------------------------------------------------------
// View kinds and payloads
// ---------------------------------------------------------------------------

/// The four dashboard views.  One variant per tab; there is no "unknown view"
/// state by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Map,
    Series,
    Distribution,
    Classification,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Map,
        ViewKind::Series,
        ViewKind::Distribution,
        ViewKind::Classification,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Map => "Map",
            ViewKind::Series => "Time series",
            ViewKind::Distribution => "Distribution",
            ViewKind::Classification => "Classification",
        }
    }
}

/// One map marker: geographic position plus the selected variable's value.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// One time-series point: per-date arithmetic mean of the selected variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub time: NaiveDate,
    pub mean: f64,
}

/// Fixed-bin histogram over the filtered values of the selected variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Observed minimum of the binned values.
    pub min: f64,
    /// Observed maximum of the binned values.
    pub max: f64,
    /// Per-bin counts; empty when no finite value survived the filter.
    pub counts: Vec<u32>,
}

impl Histogram {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn bin_width(&self) -> f64 {
        if self.counts.is_empty() {
            0.0
        } else {
            (self.max - self.min) / self.counts.len() as f64
        }
    }
}

/// The renderable output of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewData {
    Map(Vec<MapPoint>),
    Series(Vec<SeriesPoint>),
    Distribution(Histogram),
    /// Placeholder view; carries no data.
    Classification,
}

// ---------------------------------------------------------------------------
// The filter-and-render pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline: temporal filter, region filter, view transform.
///
/// Pure and deterministic: the dataset is only read, and identical inputs
/// produce equal output.  Empty filter results yield empty payloads, never
/// errors.
pub fn build_view(dataset: &Dataset, selection: &Selection, kind: ViewKind) -> ViewData {
    let indices = filtered_indices(dataset, selection);
    match kind {
        ViewKind::Map => ViewData::Map(map_points(dataset, &indices, selection.variable)),
        ViewKind::Series => ViewData::Series(series_means(dataset, &indices, selection.variable)),
        ViewKind::Distribution => {
            ViewData::Distribution(histogram(dataset, &indices, selection.variable))
        }
        ViewKind::Classification => ViewData::Classification,
    }
}

/// One point per surviving record, positioned by (lat, lon) and carrying the
/// selected variable's value.  No aggregation; non-finite values keep their
/// point (the renderer falls back to a neutral color for them).
pub fn map_points(dataset: &Dataset, indices: &[usize], variable: Variable) -> Vec<MapPoint> {
    indices
        .iter()
        .map(|&i| {
            let obs = &dataset.observations[i];
            MapPoint {
                lat: obs.lat,
                lon: obs.lon,
                value: obs.value(variable),
            }
        })
        .collect()
}

/// Per-date arithmetic mean of the selected variable, ordered by date, one
/// point per distinct date.  Non-finite values are excluded from the mean; a
/// date with no finite value produces no point.
pub fn series_means(dataset: &Dataset, indices: &[usize], variable: Variable) -> Vec<SeriesPoint> {
    let mut groups: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for &i in indices {
        let obs = &dataset.observations[i];
        let value = obs.value(variable);
        if !value.is_finite() {
            continue;
        }
        let entry = groups.entry(obs.time).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(time, (sum, count))| SeriesPoint {
            time,
            mean: sum / count as f64,
        })
        .collect()
}

/// Histogram of the selected variable over the surviving records: exactly
/// [`HISTOGRAM_BINS`] equal-width bins spanning the observed min/max of the
/// finite values.  A value equal to the maximum lands in the last bin; when
/// all values coincide the mass collects in the first bin.
pub fn histogram(dataset: &Dataset, indices: &[usize], variable: Variable) -> Histogram {
    let values: Vec<f64> = indices
        .iter()
        .map(|&i| dataset.observations[i].value(variable))
        .filter(|v| v.is_finite())
        .collect();

    if values.is_empty() {
        return Histogram {
            min: 0.0,
            max: 0.0,
            counts: Vec::new(),
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let mut counts = vec![0u32; HISTOGRAM_BINS];
    for v in values {
        let bin = if range > 0.0 {
            (((v - min) / range) * HISTOGRAM_BINS as f64) as usize
        } else {
            0
        };
        counts[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }

    Histogram { min, max, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Measurements, Observation};
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(time: NaiveDate, provincia: Option<&str>, soil_moisture: f64) -> Observation {
        let mut values = Measurements::default();
        values.set(Variable::SoilMoisture0_10, soil_moisture);
        Observation {
            time,
            lat: -1.5,
            lon: -78.0,
            provincia: provincia.map(str::to_string),
            values,
        }
    }

    fn selection(start: NaiveDate, end: NaiveDate) -> Selection {
        Selection {
            variable: Variable::SoilMoisture0_10,
            provinces: BTreeSet::new(),
            date_start: start,
            date_end: end,
        }
    }

    #[test]
    fn series_averages_records_sharing_a_date() {
        // Two records on the same day with values 10 and 20 -> one point at 15.
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), None, 10.0),
            obs(date(2021, 1, 1), None, 20.0),
        ]);
        let sel = selection(date(2021, 1, 1), date(2021, 1, 31));
        let ViewData::Series(points) = build_view(&ds, &sel, ViewKind::Series) else {
            panic!("expected series payload");
        };
        assert_eq!(
            points,
            vec![SeriesPoint {
                time: date(2021, 1, 1),
                mean: 15.0
            }]
        );
    }

    #[test]
    fn series_emits_one_point_per_distinct_date_in_order() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 2, 1), None, 4.0),
            obs(date(2021, 1, 1), None, 1.0),
            obs(date(2021, 2, 1), None, 6.0),
            obs(date(2021, 3, 1), None, 9.0),
        ]);
        let points = series_means(&ds, &[0, 1, 2, 3], Variable::SoilMoisture0_10);
        let times: Vec<NaiveDate> = points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![date(2021, 1, 1), date(2021, 2, 1), date(2021, 3, 1)]);
        assert_eq!(points[1].mean, 5.0);
    }

    #[test]
    fn series_skips_non_finite_values() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), None, f64::NAN),
            obs(date(2021, 1, 1), None, 8.0),
            obs(date(2021, 1, 2), None, f64::NAN),
        ]);
        let points = series_means(&ds, &[0, 1, 2], Variable::SoilMoisture0_10);
        // The all-NaN date produces no point; the mixed date averages finites.
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].mean, 8.0);
    }

    #[test]
    fn map_keeps_one_point_per_record() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), Some("Napo"), 3.0),
            obs(date(2021, 1, 1), Some("Napo"), f64::NAN),
        ]);
        let points = map_points(&ds, &[0, 1], Variable::SoilMoisture0_10);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 3.0);
        assert!(points[1].value.is_nan());
    }

    #[test]
    fn histogram_has_forty_bins_spanning_min_max() {
        let observations: Vec<Observation> = (0..100)
            .map(|i| obs(date(2021, 1, 1), None, i as f64))
            .collect();
        let ds = Dataset::from_observations(observations);
        let indices: Vec<usize> = (0..ds.len()).collect();
        let hist = histogram(&ds, &indices, Variable::SoilMoisture0_10);

        assert_eq!(hist.counts.len(), HISTOGRAM_BINS);
        assert_eq!(hist.min, 0.0);
        assert_eq!(hist.max, 99.0);
        assert_eq!(hist.counts.iter().sum::<u32>(), 100);
        // The maximum lands in the last bin, not past it.
        assert!(hist.counts[HISTOGRAM_BINS - 1] > 0);
    }

    #[test]
    fn histogram_with_identical_values_collects_in_first_bin() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), None, 5.0),
            obs(date(2021, 1, 2), None, 5.0),
        ]);
        let hist = histogram(&ds, &[0, 1], Variable::SoilMoisture0_10);
        assert_eq!(hist.counts.len(), HISTOGRAM_BINS);
        assert_eq!(hist.counts[0], 2);
        assert_eq!(hist.counts[1..].iter().sum::<u32>(), 0);
    }

    #[test]
    fn excluding_date_range_yields_empty_views_not_errors() {
        let ds = Dataset::from_observations(vec![obs(date(2021, 6, 1), Some("Loja"), 1.0)]);
        let sel = selection(date(2030, 1, 1), date(2030, 12, 31));

        assert_eq!(build_view(&ds, &sel, ViewKind::Map), ViewData::Map(Vec::new()));
        assert_eq!(
            build_view(&ds, &sel, ViewKind::Series),
            ViewData::Series(Vec::new())
        );
        let ViewData::Distribution(hist) = build_view(&ds, &sel, ViewKind::Distribution) else {
            panic!("expected distribution payload");
        };
        assert!(hist.is_empty());
    }

    #[test]
    fn classification_is_a_fixed_placeholder() {
        let ds = Dataset::from_observations(vec![obs(date(2021, 6, 1), None, 1.0)]);
        let a = build_view(&ds, &selection(date(2021, 1, 1), date(2021, 12, 31)), ViewKind::Classification);
        let b = build_view(&ds, &selection(date(2030, 1, 1), date(2030, 12, 31)), ViewKind::Classification);
        assert_eq!(a, ViewData::Classification);
        assert_eq!(a, b);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), Some("Pichincha"), 12.0),
            obs(date(2021, 1, 2), Some("Guayas"), 18.0),
            obs(date(2021, 1, 3), None, 24.0),
        ]);
        let sel = selection(date(2021, 1, 1), date(2021, 1, 31));
        for kind in ViewKind::ALL {
            assert_eq!(build_view(&ds, &sel, kind), build_view(&ds, &sel, kind));
        }
    }

    #[test]
    fn region_scenario_keeps_only_the_matching_record() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 1, 1), Some("Pichincha"), 7.0),
            obs(date(2021, 1, 1), Some("Guayas"), 9.0),
        ]);
        let mut sel = selection(date(2021, 1, 1), date(2021, 1, 31));
        sel.provinces = ["Pichincha".to_string()].into_iter().collect();
        let ViewData::Map(points) = build_view(&ds, &sel, ViewKind::Map) else {
            panic!("expected map payload");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 7.0);
    }
}
