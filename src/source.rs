//! Frame sources: where temperature grids and timestamps
//! come from.
//!
//! The engine only talks to the [`FrameSource`] trait.
//! [`CsvFrameSource`] reads radiometric CSV exports from
//! disk; [`MemorySource`] serves pre-decoded grids.
use std::{collections::HashMap, fmt, io::Read, path::Path, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use ndarray::Array2;
use regex::Regex;
use serde_derive::*;

use crate::frame::Shape;

/// Camera that produced the exported frames. Selects the
/// CSV dialect used to decode them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    /// Semicolon separated, with leading metadata lines.
    Mobotix,
    /// Plain comma separated numeric grid.
    Generic,
}

impl Default for CameraType {
    fn default() -> Self {
        CameraType::Mobotix
    }
}

impl CameraType {
    pub const ALL: [CameraType; 2] = [CameraType::Mobotix, CameraType::Generic];

    fn delimiter(&self) -> u8 {
        match self {
            CameraType::Mobotix => b';',
            CameraType::Generic => b',',
        }
    }

    fn skips_preamble(&self) -> bool {
        matches!(self, CameraType::Mobotix)
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CameraType::Mobotix => "MOBOTIX",
            CameraType::Generic => "GENERIC",
        })
    }
}

impl FromStr for CameraType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        CameraType::ALL
            .iter()
            .copied()
            .find(|c| c.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown camera type: {}", s))
    }
}

/// Provider of frame grids and timestamps.
pub trait FrameSource {
    /// Decode the temperature grid identified by `id`.
    fn load(&self, id: &str, camera: CameraType) -> Result<Array2<f64>>;

    /// Timestamp of the frame identified by `id`.
    fn extract_timestamp(&self, id: &str) -> Result<NaiveDateTime>;

    /// Grid shape of the frame identified by `id`. Decodes the
    /// whole frame unless the source knows better.
    fn dimensions(&self, id: &str, camera: CameraType) -> Result<Shape> {
        Ok(Shape::of(&self.load(id, camera)?))
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &S {
    fn load(&self, id: &str, camera: CameraType) -> Result<Array2<f64>> {
        (**self).load(id, camera)
    }

    fn extract_timestamp(&self, id: &str) -> Result<NaiveDateTime> {
        (**self).extract_timestamp(id)
    }

    fn dimensions(&self, id: &str, camera: CameraType) -> Result<Shape> {
        (**self).dimensions(id, camera)
    }
}

/// Reads frames from CSV files; identifiers are paths and
/// timestamps are parsed from the file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvFrameSource;

impl FrameSource for CsvFrameSource {
    fn load(&self, id: &str, camera: CameraType) -> Result<Array2<f64>> {
        let file = std::fs::File::open(id).with_context(|| format!("opening {}", id))?;
        read_csv_grid(file, camera).with_context(|| format!("reading {}", id))
    }

    fn extract_timestamp(&self, id: &str) -> Result<NaiveDateTime> {
        let name = Path::new(id)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("no file name in path"))?;
        timestamp_from_name(name)
    }
}

/// Parse a temperature grid from CSV text in the dialect of
/// `camera`.
///
/// Empty cells decode as NaN. A single trailing empty field
/// (trailing delimiter) is dropped. For cameras with a
/// metadata preamble, the grid starts at the first fully
/// numeric row that the following row does not contradict:
/// a lone numeric line (e.g. `336;252`) followed by a
/// non-numeric line or a row of another width is preamble.
pub fn read_csv_grid<R: Read>(rdr: R, camera: CameraType) -> Result<Array2<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(camera.delimiter())
        .from_reader(rdr);

    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let mut fields: Vec<&str> = record.iter().collect();
        if fields.len() > 1 && fields.last() == Some(&"") {
            fields.pop();
        }
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        // Still inside a possible preamble.
        let in_preamble = camera.skips_preamble() && rows <= 1;

        let parsed: Result<Vec<f64>> = fields.iter().map(|f| parse_cell(f)).collect();
        let parsed = match parsed {
            Ok(p) => p,
            Err(_) if in_preamble => {
                values.clear();
                rows = 0;
                cols = None;
                continue;
            }
            Err(e) => return Err(e.context(format!("line {}", line + 1))),
        };

        match cols {
            None => cols = Some(parsed.len()),
            Some(c) if c != parsed.len() && in_preamble => {
                values.clear();
                rows = 0;
                cols = Some(parsed.len());
            }
            Some(c) if c != parsed.len() => bail!(
                "line {}: expected {} values, found {}",
                line + 1,
                c,
                parsed.len()
            ),
            _ => {}
        }
        values.extend(parsed);
        rows += 1;
    }

    let cols = cols.ok_or_else(|| anyhow!("no temperature rows found"))?;
    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

fn parse_cell(cell: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .or_else(|_| cell.replace(',', ".").parse())
        .with_context(|| format!("invalid temperature value `{}`", cell))
}

/// Extract a timestamp from a file name.
///
/// Recognizes `YYYY-MM-DD_HH-MM-SS`, `YYYYMMDD_HHMMSS`,
/// `YYYYMMDDHHMMSS` and `YYYY-MM-DD HH:MM:SS`, with any of
/// `-`, `_`, `.`, `:` or a space as separators. The first
/// candidate forming a valid date and time wins.
pub fn timestamp_from_name(name: &str) -> Result<NaiveDateTime> {
    lazy_static! {
        static ref RE: Regex = Regex::new(
            r"(?:^|\D)(\d{4})[-_.]?(\d{2})[-_.]?(\d{2})[-_. T]?(\d{2})[-_.:]?(\d{2})[-_.:]?(\d{2})(?:\D|$)"
        )
        .unwrap();
    }

    RE.captures_iter(name)
        .find_map(|caps| {
            let num = |i: usize| caps[i].parse::<u32>().ok();
            NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?)?
                .and_hms_opt(num(4)?, num(5)?, num(6)?)
        })
        .ok_or_else(|| anyhow!("no date and time found in `{}`", name))
}

/// Frames held in memory, keyed by identifier.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    frames: HashMap<String, (NaiveDateTime, Array2<f64>)>,
}

impl MemorySource {
    pub fn insert(&mut self, id: impl Into<String>, timestamp: NaiveDateTime, grid: Array2<f64>) {
        self.frames.insert(id.into(), (timestamp, grid));
    }

    pub fn remove(&mut self, id: &str) -> Option<Array2<f64>> {
        self.frames.remove(id).map(|(_, grid)| grid)
    }
}

impl FrameSource for MemorySource {
    fn load(&self, id: &str, _camera: CameraType) -> Result<Array2<f64>> {
        self.frames
            .get(id)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| anyhow!("no frame `{}`", id))
    }

    fn extract_timestamp(&self, id: &str) -> Result<NaiveDateTime> {
        self.frames
            .get(id)
            .map(|(ts, _)| *ts)
            .ok_or_else(|| anyhow!("no frame `{}`", id))
    }

    fn dimensions(&self, id: &str, _camera: CameraType) -> Result<Shape> {
        self.frames
            .get(id)
            .map(|(_, grid)| Shape::of(grid))
            .ok_or_else(|| anyhow!("no frame `{}`", id))
    }
}
