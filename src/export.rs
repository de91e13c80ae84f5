//! Tabular export of time series.
//!
//! One `Timestamp` column (`YYYY-MM-DD HH:MM:SS`) followed by
//! the series columns of [`TimeSeries::columns`]. Values are
//! written with three decimals; NaN becomes an empty cell.
use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};

use crate::series::TimeSeries;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn write_csv<W: Write>(series: &TimeSeries, writer: W) -> Result<()> {
    let columns: Vec<_> = series.columns().collect();
    let mut wtr = csv::Writer::from_writer(writer);

    let header = std::iter::once("Timestamp").chain(columns.iter().map(|(name, _)| name.as_str()));
    wtr.write_record(header)?;

    for (row, ts) in series.timestamps().iter().enumerate() {
        let mut record = vec![ts.format(TIMESTAMP_FORMAT).to_string()];
        record.extend(columns.iter().map(|(_, values)| format_value(values[row])));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_csv<P: AsRef<Path>>(series: &TimeSeries, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(series, file).with_context(|| format!("writing {}", path.display()))
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{:.3}", v)
    }
}
