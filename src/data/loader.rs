use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::error::DataError;
use super::model::{Dataset, Measurements, Observation, Variable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `time`, `lat`, `lon`, `provincia` and the
///   seven measurement columns (the original export format)
/// * `.json`    – records-oriented array, `df.to_json(orient='records')`
/// * `.parquet` – flat columns with the same names
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedExtension(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse a timestamp cell, truncating any time-of-day part.
/// Accepts `2021-01-31`, `2021-01-31T06:00:00` and `2021-01-31 06:00:00`.
fn parse_time(cell: &str) -> Option<NaiveDate> {
    let t = cell.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Empty / whitespace-only province cells become `None`.
fn normalize_province(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Measurement cells are permissive: empty or unparseable values load as NaN,
/// the way a dataframe read would surface them.
fn parse_measurement(cell: Option<&str>) -> f64 {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    parse_csv(reader)
}

/// Parse CSV from any reader (unit-testable without touching the filesystem).
pub(crate) fn parse_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Dataset> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let index_of = |name: &'static str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(DataError::MissingColumn(name))
    };

    let time_idx = index_of("time")?;
    let lat_idx = index_of("lat")?;
    let lon_idx = index_of("lon")?;
    let prov_idx = index_of("provincia")?;

    // Recognise the measurement columns wherever they sit in the header.
    let measurement_cols: Vec<(Variable, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| Variable::from_column(h).map(|var| (var, idx)))
        .collect();
    for var in Variable::ALL {
        if !measurement_cols.iter().any(|&(v, _)| v == var) {
            return Err(DataError::MissingColumn(var.column_name()).into());
        }
    }

    let mut observations = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let time_cell = record.get(time_idx).unwrap_or("");
        let time = parse_time(time_cell).ok_or_else(|| DataError::BadTimestamp {
            row: row_no,
            value: time_cell.to_string(),
        })?;

        let lat = parse_coordinate(record.get(lat_idx), row_no, "lat")?;
        let lon = parse_coordinate(record.get(lon_idx), row_no, "lon")?;
        let provincia = normalize_province(record.get(prov_idx));

        let mut values = Measurements::default();
        for &(var, idx) in &measurement_cols {
            values.set(var, parse_measurement(record.get(idx)));
        }

        observations.push(Observation {
            time,
            lat,
            lon,
            provincia,
            values,
        });
    }

    Ok(Dataset::from_observations(observations))
}

fn parse_coordinate(
    cell: Option<&str>,
    row: usize,
    column: &'static str,
) -> Result<f64, DataError> {
    let raw = cell.unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| DataError::BadCoordinate {
        row,
        column,
        value: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// One record of `df.to_json(orient='records')`.  Pandas emits timestamps
/// either as epoch milliseconds (its default) or as ISO text.
#[derive(Debug, Deserialize)]
struct RawRecord {
    time: JsonTime,
    lat: f64,
    lon: f64,
    #[serde(default)]
    provincia: Option<String>,
    #[serde(rename = "SoilMoi0_10cm_inst", default)]
    soil_moisture_0_10: Option<f64>,
    #[serde(rename = "SoilMoi10_40cm_inst", default)]
    soil_moisture_10_40: Option<f64>,
    #[serde(rename = "RootMoist_inst", default)]
    root_zone_moisture: Option<f64>,
    #[serde(rename = "SoilTMP0_10cm_inst", default)]
    soil_temperature: Option<f64>,
    #[serde(rename = "Tair_f_inst", default)]
    air_temperature: Option<f64>,
    #[serde(rename = "Rainf_tavg", default)]
    rainfall: Option<f64>,
    #[serde(rename = "Evap_tavg", default)]
    evaporation: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonTime {
    Millis(i64),
    Text(String),
}

impl JsonTime {
    fn to_date(&self, row: usize) -> Result<NaiveDate, DataError> {
        match self {
            JsonTime::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::BadTimestamp {
                    row,
                    value: ms.to_string(),
                }),
            JsonTime::Text(s) => parse_time(s).ok_or_else(|| DataError::BadTimestamp {
                row,
                value: s.clone(),
            }),
        }
    }
}

impl RawRecord {
    fn into_observation(self, row: usize) -> Result<Observation, DataError> {
        let time = self.time.to_date(row)?;
        let nan = f64::NAN;
        Ok(Observation {
            time,
            lat: self.lat,
            lon: self.lon,
            provincia: self.provincia.as_deref().and_then(|p| {
                let p = p.trim();
                (!p.is_empty()).then(|| p.to_string())
            }),
            values: Measurements {
                soil_moisture_0_10: self.soil_moisture_0_10.unwrap_or(nan),
                soil_moisture_10_40: self.soil_moisture_10_40.unwrap_or(nan),
                root_zone_moisture: self.root_zone_moisture.unwrap_or(nan),
                soil_temperature: self.soil_temperature.unwrap_or(nan),
                air_temperature: self.air_temperature.unwrap_or(nan),
                rainfall: self.rainfall.unwrap_or(nan),
                evaporation: self.evaporation.unwrap_or(nan),
            },
        })
    }
}

fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse a records-oriented JSON export (unit-testable from a string).
pub(crate) fn parse_json(text: &str) -> Result<Dataset> {
    let records: Vec<RawRecord> = serde_json::from_str(text).context("parsing JSON records")?;

    let observations = records
        .into_iter()
        .enumerate()
        .map(|(row, rec)| rec.into_observation(row).map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::from_observations(observations))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// `time` may be Date32, Timestamp (ms/us/ns) or Utf8; numeric columns may be
/// Float64, Float32, Int64 or Int32.  Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut observations = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let index_of = |name: &'static str| -> Result<usize, DataError> {
            schema.index_of(name).map_err(|_| DataError::MissingColumn(name))
        };

        let time_col = batch.column(index_of("time")?);
        let lat_col = batch.column(index_of("lat")?);
        let lon_col = batch.column(index_of("lon")?);
        let prov_col = batch.column(index_of("provincia")?);

        let measurement_cols: Vec<(Variable, &ArrayRef)> = Variable::ALL
            .into_iter()
            .map(|var| Ok((var, batch.column(index_of(var.column_name())?))))
            .collect::<Result<_, DataError>>()?;

        for row in 0..batch.num_rows() {
            let time =
                date_at(time_col, row).with_context(|| format!("row {row}: reading 'time'"))?;
            let lat = f64_at(lat_col, row).with_context(|| format!("row {row}: reading 'lat'"))?;
            let lon = f64_at(lon_col, row).with_context(|| format!("row {row}: reading 'lon'"))?;
            let provincia = string_at(prov_col, row).and_then(|p| {
                let p = p.trim().to_string();
                (!p.is_empty()).then_some(p)
            });

            let mut values = Measurements::default();
            for &(var, col) in &measurement_cols {
                let v = f64_at(col, row)
                    .with_context(|| format!("row {row}: reading '{}'", var.column_name()))?;
                values.set(var, v);
            }

            observations.push(Observation {
                time,
                lat,
                lon,
                provincia,
                values,
            });
        }
    }

    Ok(Dataset::from_observations(observations))
}

// -- Parquet / Arrow helpers --

/// Extract an `f64` from a numeric column; nulls load as NaN.
fn f64_at(col: &ArrayRef, row: usize) -> Result<f64> {
    if col.is_null(row) {
        return Ok(f64::NAN);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("expected a numeric column, got {:?}", col.data_type())
    }
}

/// Extract an optional string from a Utf8 / LargeUtf8 column.
fn string_at(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

/// Extract a date from a Date32, Timestamp or Utf8 column.
fn date_at(col: &ArrayRef, row: usize) -> Result<NaiveDate> {
    if col.is_null(row) {
        bail!("null timestamp");
    }
    let epoch = NaiveDateTime::UNIX_EPOCH.date();
    match col.data_type() {
        DataType::Date32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Date32Array>()
                .context("expected Date32Array")?;
            Ok(epoch + Duration::days(arr.value(row) as i64))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = col
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .context("expected TimestampMillisecondArray")?;
            DateTime::from_timestamp_millis(arr.value(row))
                .map(|dt| dt.date_naive())
                .context("timestamp out of range")
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr = col
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .context("expected TimestampMicrosecondArray")?;
            DateTime::from_timestamp_micros(arr.value(row))
                .map(|dt| dt.date_naive())
                .context("timestamp out of range")
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let arr = col
                .as_any()
                .downcast_ref::<TimestampNanosecondArray>()
                .context("expected TimestampNanosecondArray")?;
            Ok(DateTime::from_timestamp_nanos(arr.value(row)).date_naive())
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = string_at(col, row).unwrap_or_default();
            parse_time(&text).with_context(|| format!("cannot parse '{text}' as a date"))
        }
        other => bail!("unsupported time column type {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "time,lat,lon,provincia,SoilMoi0_10cm_inst,SoilMoi10_40cm_inst,\
RootMoist_inst,SoilTMP0_10cm_inst,Tair_f_inst,Rainf_tavg,Evap_tavg";

    fn csv_dataset(body: &str) -> Result<Dataset> {
        let text = format!("{HEADER}\n{body}");
        parse_csv(csv::Reader::from_reader(Cursor::new(text)))
    }

    #[test]
    fn csv_parses_a_full_row() {
        let ds = csv_dataset(
            "2021-01-01,-0.25,-78.5,Pichincha,21.5,80.2,310.0,290.1,288.4,0.0001,0.00002",
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        let obs = &ds.observations[0];
        assert_eq!(obs.time, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(obs.provincia.as_deref(), Some("Pichincha"));
        assert_eq!(obs.value(Variable::SoilMoisture0_10), 21.5);
        assert_eq!(obs.value(Variable::Evaporation), 0.00002);
        assert_eq!(ds.provinces, vec!["Pichincha"]);
    }

    #[test]
    fn csv_missing_column_is_structural_error() {
        let text = "time,lat,lon,SoilMoi0_10cm_inst\n2021-01-01,0.0,0.0,1.0";
        let err = parse_csv(csv::Reader::from_reader(Cursor::new(text))).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::MissingColumn(name)) => assert_eq!(*name, "provincia"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_empty_cells_are_permissive() {
        let ds = csv_dataset("2021-01-01,-1.0,-79.0,,,,,,,,").unwrap();
        let obs = &ds.observations[0];
        assert_eq!(obs.provincia, None);
        assert!(obs.value(Variable::SoilMoisture0_10).is_nan());
        assert!(obs.value(Variable::Rainfall).is_nan());
        assert!(ds.provinces.is_empty());
    }

    #[test]
    fn csv_bad_timestamp_is_fatal() {
        let err = csv_dataset("yesterday,-1.0,-79.0,Loja,1,1,1,1,1,1,1").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::BadTimestamp { row: 0, .. })
        ));
    }

    #[test]
    fn csv_datetime_truncates_to_date() {
        let ds = csv_dataset("2022-06-15 03:00:00,-1.0,-79.0,Azuay,1,1,1,1,1,1,1").unwrap();
        assert_eq!(
            ds.observations[0].time,
            NaiveDate::from_ymd_opt(2022, 6, 15).unwrap()
        );
    }

    #[test]
    fn json_accepts_iso_text_and_epoch_millis() {
        let text = r#"[
            {"time": "2021-01-01", "lat": -0.2, "lon": -78.5, "provincia": "Pichincha",
             "SoilMoi0_10cm_inst": 20.0},
            {"time": 1609459200000, "lat": -2.2, "lon": -79.9, "provincia": null,
             "SoilMoi0_10cm_inst": 30.0}
        ]"#;
        let ds = parse_json(text).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.observations[0].time, ds.observations[1].time);
        assert_eq!(ds.observations[1].provincia, None);
        // Fields absent from the record load as NaN.
        assert!(ds.observations[0].value(Variable::Rainfall).is_nan());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedExtension(ext)) if ext == "xlsx"
        ));
    }
}
