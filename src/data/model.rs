use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Variable – the seven measurement fields
// ---------------------------------------------------------------------------

/// One of the seven GLDAS measurement fields carried by every observation.
///
/// The set is closed: selecting anything outside these seven is
/// unrepresentable, so no runtime validation of the variable is needed past
/// the parse boundary ([`Variable::from_column`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    SoilMoisture0_10,
    SoilMoisture10_40,
    RootZoneMoisture,
    SoilTemperature,
    AirTemperature,
    Rainfall,
    Evaporation,
}

impl Variable {
    /// All variables, in the order the UI lists them.
    pub const ALL: [Variable; 7] = [
        Variable::SoilMoisture0_10,
        Variable::SoilMoisture10_40,
        Variable::RootZoneMoisture,
        Variable::SoilTemperature,
        Variable::AirTemperature,
        Variable::Rainfall,
        Variable::Evaporation,
    ];

    /// Column name in the source dataset.
    pub fn column_name(self) -> &'static str {
        match self {
            Variable::SoilMoisture0_10 => "SoilMoi0_10cm_inst",
            Variable::SoilMoisture10_40 => "SoilMoi10_40cm_inst",
            Variable::RootZoneMoisture => "RootMoist_inst",
            Variable::SoilTemperature => "SoilTMP0_10cm_inst",
            Variable::AirTemperature => "Tair_f_inst",
            Variable::Rainfall => "Rainf_tavg",
            Variable::Evaporation => "Evap_tavg",
        }
    }

    /// Human-readable name for selectors and axis labels.
    pub fn label(self) -> &'static str {
        match self {
            Variable::SoilMoisture0_10 => "Soil moisture 0-10 cm",
            Variable::SoilMoisture10_40 => "Soil moisture 10-40 cm",
            Variable::RootZoneMoisture => "Root-zone moisture",
            Variable::SoilTemperature => "Soil temperature 0-10 cm",
            Variable::AirTemperature => "Air temperature",
            Variable::Rainfall => "Rainfall rate",
            Variable::Evaporation => "Evaporation rate",
        }
    }

    /// Measurement unit as reported by GLDAS.
    pub fn unit(self) -> &'static str {
        match self {
            Variable::SoilMoisture0_10
            | Variable::SoilMoisture10_40
            | Variable::RootZoneMoisture => "kg/m²",
            Variable::SoilTemperature | Variable::AirTemperature => "K",
            Variable::Rainfall | Variable::Evaporation => "kg/m²/s",
        }
    }

    /// Inverse of [`Variable::column_name`].
    pub fn from_column(name: &str) -> Option<Variable> {
        Variable::ALL.into_iter().find(|v| v.column_name() == name)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Observation – one row of the dataset
// ---------------------------------------------------------------------------

/// The seven measurement values of one observation.
/// A missing or unparseable source cell is stored as `f64::NAN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Measurements {
    pub soil_moisture_0_10: f64,
    pub soil_moisture_10_40: f64,
    pub root_zone_moisture: f64,
    pub soil_temperature: f64,
    pub air_temperature: f64,
    pub rainfall: f64,
    pub evaporation: f64,
}

impl Measurements {
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::SoilMoisture0_10 => self.soil_moisture_0_10,
            Variable::SoilMoisture10_40 => self.soil_moisture_10_40,
            Variable::RootZoneMoisture => self.root_zone_moisture,
            Variable::SoilTemperature => self.soil_temperature,
            Variable::AirTemperature => self.air_temperature,
            Variable::Rainfall => self.rainfall,
            Variable::Evaporation => self.evaporation,
        }
    }

    pub fn set(&mut self, variable: Variable, value: f64) {
        match variable {
            Variable::SoilMoisture0_10 => self.soil_moisture_0_10 = value,
            Variable::SoilMoisture10_40 => self.soil_moisture_10_40 = value,
            Variable::RootZoneMoisture => self.root_zone_moisture = value,
            Variable::SoilTemperature => self.soil_temperature = value,
            Variable::AirTemperature => self.air_temperature = value,
            Variable::Rainfall => self.rainfall = value,
            Variable::Evaporation => self.evaporation = value,
        }
    }
}

/// A single timestamped, geolocated measurement row.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Observation date (source timestamps are truncated to the day).
    pub time: NaiveDate,
    pub lat: f64,
    pub lon: f64,
    /// Province label; `None` where the source cell is null/empty.
    pub provincia: Option<String>,
    pub values: Measurements,
}

impl Observation {
    /// Value of the given measurement field.
    pub fn value(&self, variable: Variable) -> f64 {
        self.values.get(variable)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed indices.
///
/// Constructed once per load and never mutated afterwards; filtering and the
/// view transforms only ever read it.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All observations (rows).
    pub observations: Vec<Observation>,
    /// Sorted distinct non-null province labels.
    pub provinces: Vec<String>,
    /// Observed (min, max) of the time column; `None` for an empty dataset.
    pub time_range: Option<(NaiveDate, NaiveDate)>,
}

impl Dataset {
    /// Build the province and date indices from the loaded rows.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let provinces: BTreeSet<String> = observations
            .iter()
            .filter_map(|obs| obs.provincia.clone())
            .collect();

        let time_range = observations.iter().map(|obs| obs.time).fold(
            None,
            |acc: Option<(NaiveDate, NaiveDate)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            },
        );

        Dataset {
            observations,
            provinces: provinces.into_iter().collect(),
            time_range,
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(time: NaiveDate, provincia: Option<&str>) -> Observation {
        Observation {
            time,
            lat: -0.2,
            lon: -78.5,
            provincia: provincia.map(str::to_string),
            values: Measurements::default(),
        }
    }

    #[test]
    fn from_column_inverts_column_name() {
        for var in Variable::ALL {
            assert_eq!(Variable::from_column(var.column_name()), Some(var));
        }
        assert_eq!(Variable::from_column("Wind_f_inst"), None);
    }

    #[test]
    fn indices_deduplicate_and_sort_provinces() {
        let ds = Dataset::from_observations(vec![
            obs(date(2021, 3, 1), Some("Pichincha")),
            obs(date(2021, 1, 1), Some("Guayas")),
            obs(date(2021, 2, 1), Some("Pichincha")),
            obs(date(2021, 4, 1), None),
        ]);
        assert_eq!(ds.provinces, vec!["Guayas", "Pichincha"]);
        assert_eq!(ds.time_range, Some((date(2021, 1, 1), date(2021, 4, 1))));
    }

    #[test]
    fn empty_dataset_has_no_time_range() {
        let ds = Dataset::from_observations(Vec::new());
        assert!(ds.is_empty());
        assert!(ds.provinces.is_empty());
        assert_eq!(ds.time_range, None);
    }

    #[test]
    fn measurement_accessors_cover_all_variables() {
        let mut values = Measurements::default();
        for (i, var) in Variable::ALL.into_iter().enumerate() {
            values.set(var, i as f64);
        }
        for (i, var) in Variable::ALL.into_iter().enumerate() {
            assert_eq!(values.get(var), i as f64);
        }
    }
}
