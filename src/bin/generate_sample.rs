use std::sync::Arc;

use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (province, center lat, center lon, temperature offset in K)
    // The last entry has no label: rows near the coast line come unlabeled in
    // the real export, so some null provincia cells belong in the sample too.
    let regions: [(Option<&str>, f64, f64, f64); 7] = [
        (Some("Pichincha"), -0.22, -78.51, -4.0),
        (Some("Guayas"), -2.19, -79.89, 2.0),
        (Some("Azuay"), -2.90, -79.00, -3.0),
        (Some("Manabi"), -0.95, -80.73, 1.5),
        (Some("Loja"), -3.99, -79.20, -1.0),
        (Some("Napo"), -0.99, -77.81, 0.5),
        (None, -1.50, -81.10, 2.5),
    ];
    let stations_per_region = 6;

    // First day of each month, 2020-01 through 2024-12.
    let months: Vec<NaiveDate> = (2020..=2024)
        .flat_map(|year| (1..=12).map(move |month| (year, month)))
        .filter_map(|(year, month)| NaiveDate::from_ymd_opt(year, month, 1))
        .collect();

    let mut times: Vec<i32> = Vec::new();
    let mut lats: Vec<f64> = Vec::new();
    let mut lons: Vec<f64> = Vec::new();
    let mut provinces: Vec<Option<String>> = Vec::new();
    let mut soil_moi_0_10: Vec<f64> = Vec::new();
    let mut soil_moi_10_40: Vec<f64> = Vec::new();
    let mut root_moist: Vec<f64> = Vec::new();
    let mut soil_tmp: Vec<f64> = Vec::new();
    let mut tair: Vec<f64> = Vec::new();
    let mut rainf: Vec<f64> = Vec::new();
    let mut evap: Vec<f64> = Vec::new();

    let epoch = NaiveDateTime::UNIX_EPOCH.date();

    for (province, lat0, lon0, temp_offset) in &regions {
        for _ in 0..stations_per_region {
            let lat = lat0 + rng.gauss(0.0, 0.35);
            let lon = lon0 + rng.gauss(0.0, 0.35);

            for &date in &months {
                // Wet season peaks around March in the Ecuadorian highlands.
                let phase =
                    2.0 * std::f64::consts::PI * (date.ordinal() as f64 / 365.0 - 0.2);
                let wet = phase.sin();

                let sm = (20.0 + 8.0 * wet + rng.gauss(0.0, 1.5)).max(0.0);
                let rain = (1.0e-4 * (1.0 + wet) + rng.gauss(0.0, 4.0e-5)).max(0.0);

                times.push((date - epoch).num_days() as i32);
                lats.push(lat);
                lons.push(lon);
                provinces.push(province.map(str::to_string));
                soil_moi_0_10.push(sm);
                soil_moi_10_40.push((sm * 3.2 + rng.gauss(0.0, 3.0)).max(0.0));
                root_moist.push((sm * 14.0 + rng.gauss(0.0, 10.0)).max(0.0));
                soil_tmp.push(295.0 + temp_offset + 2.5 * wet + rng.gauss(0.0, 0.8));
                tair.push(293.0 + temp_offset + 3.5 * wet + rng.gauss(0.0, 1.0));
                rainf.push(rain);
                evap.push((3.0e-5 + 1.0e-5 * wet + rng.gauss(0.0, 8.0e-6)).max(0.0));
            }
        }
    }

    let n_rows = times.len();

    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Date32, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("provincia", DataType::Utf8, true),
        Field::new("SoilMoi0_10cm_inst", DataType::Float64, false),
        Field::new("SoilMoi10_40cm_inst", DataType::Float64, false),
        Field::new("RootMoist_inst", DataType::Float64, false),
        Field::new("SoilTMP0_10cm_inst", DataType::Float64, false),
        Field::new("Tair_f_inst", DataType::Float64, false),
        Field::new("Rainf_tavg", DataType::Float64, false),
        Field::new("Evap_tavg", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Date32Array::from(times)),
            Arc::new(Float64Array::from(lats)),
            Arc::new(Float64Array::from(lons)),
            Arc::new(StringArray::from(provinces)),
            Arc::new(Float64Array::from(soil_moi_0_10)),
            Arc::new(Float64Array::from(soil_moi_10_40)),
            Arc::new(Float64Array::from(root_moist)),
            Arc::new(Float64Array::from(soil_tmp)),
            Arc::new(Float64Array::from(tair)),
            Arc::new(Float64Array::from(rainf)),
            Arc::new(Float64Array::from(evap)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_gldas.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {n_rows} observations ({} stations, {} months) to {output_path}",
        regions.len() * stations_per_region,
        months.len()
    );
}
