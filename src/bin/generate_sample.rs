use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const AGE_GROUPS: [&str; 8] = ["0-4", "5-9", "10-14", "15-19", "20-39", "40-59", "60-79", "80+"];
const ALL_AGES: &str = "00+";
const DAYS: i64 = 730;
/// Days at the start of the extract before the prediction model has enough history.
const WARMUP_DAYS: i64 = 28;

/// (syndrome, baseline admissions, seasonal amplitude, per-age weights)
const SYNDROMES: [(&str, f64, f64, [f64; 8]); 3] = [
    ("SARI", 0.04, 0.10, [0.20, 0.03, 0.02, 0.02, 0.05, 0.10, 0.25, 0.33]),
    ("ARI", 0.60, 0.90, [0.25, 0.10, 0.06, 0.05, 0.18, 0.14, 0.12, 0.10]),
    ("ILI", 0.20, 0.45, [0.12, 0.09, 0.08, 0.08, 0.30, 0.22, 0.11, 0.0]),
];

#[derive(Debug, Serialize)]
struct Row {
    date: NaiveDate,
    syndrome: &'static str,
    age_group: &'static str,
    relative_cases: f64,
    expected_lowerbound: Option<f64>,
    expected_upperbound: Option<f64>,
}

/// Winter wave peaking around the turn of the year.
fn seasonal(date: NaiveDate) -> f64 {
    let day = date.ordinal0() as f64;
    let phase = (day - 5.0) / 365.25 * std::f64::consts::TAU;
    ((phase.cos() + 1.0) / 2.0).powi(3)
}

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

fn generate_rows(start: NaiveDate) -> Vec<Row> {
    let mut rng = SimpleRng::new(42);
    let mut rows = Vec::new();

    for day in 0..DAYS {
        let date = start + Duration::days(day);
        let season = seasonal(date);
        let with_bounds = day >= WARMUP_DAYS;

        for (syndrome, baseline, amplitude, weights) in SYNDROMES {
            let expected_total = baseline + amplitude * season;
            let mut total = 0.0;
            let mut total_expected = 0.0;

            for (age_group, weight) in AGE_GROUPS.iter().zip(weights) {
                if weight == 0.0 {
                    continue;
                }
                let expected = expected_total * weight * 4.0;
                let cases = rng.gauss(expected, expected * 0.15).max(0.0);
                total += cases;
                total_expected += expected;
                rows.push(Row {
                    date,
                    syndrome,
                    age_group: *age_group,
                    relative_cases: round3(cases),
                    expected_lowerbound: with_bounds.then(|| round3(expected * 0.8)),
                    expected_upperbound: with_bounds.then(|| round3(expected * 1.2)),
                });
            }

            rows.push(Row {
                date,
                syndrome,
                age_group: ALL_AGES,
                relative_cases: round3(total / 4.0),
                expected_lowerbound: with_bounds.then(|| round3(total_expected / 4.0 * 0.8)),
                expected_upperbound: with_bounds.then(|| round3(total_expected / 4.0 * 1.2)),
            });
        }
    }
    rows
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;
    let dates = Date32Array::from(
        rows.iter()
            .map(|r| (r.date - epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    );
    let syndromes = StringArray::from(rows.iter().map(|r| r.syndrome).collect::<Vec<_>>());
    let age_groups = StringArray::from(rows.iter().map(|r| r.age_group).collect::<Vec<_>>());
    let cases = Float64Array::from(rows.iter().map(|r| r.relative_cases).collect::<Vec<_>>());
    let lower = Float64Array::from(rows.iter().map(|r| r.expected_lowerbound).collect::<Vec<_>>());
    let upper = Float64Array::from(rows.iter().map(|r| r.expected_upperbound).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Date32, false),
        Field::new("syndrome", DataType::Utf8, false),
        Field::new("age_group", DataType::Utf8, false),
        Field::new("relative_cases", DataType::Float64, false),
        Field::new("expected_lowerbound", DataType::Float64, true),
        Field::new("expected_upperbound", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(dates),
            Arc::new(syndromes),
            Arc::new(age_groups),
            Arc::new(cases),
            Arc::new(lower),
            Arc::new(upper),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

/// Write a synthetic surveillance extract for trying out the dashboard.
#[derive(Parser)]
struct Args {
    /// Output file; `.parquet` / `.pq` writes Parquet, anything else CSV
    #[arg(default_value = "sample_surveillance.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let output_path = Args::parse().output;

    let start = NaiveDate::from_ymd_opt(2022, 7, 1).context("start date")?;
    let rows = generate_rows(start);

    match output_path.extension().and_then(|e| e.to_str()) {
        Some("parquet") | Some("pq") => write_parquet(&rows, &output_path)?,
        _ => write_csv(&rows, &output_path)?,
    }

    println!("Wrote {} rows over {DAYS} days to {}", rows.len(), output_path.display());
    Ok(())
}
