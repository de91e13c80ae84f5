//! Temperature time series from a selection.
//!
//! Both builders walk every frame of a [`FrameSequence`],
//! decoding it through a [`FrameSource`]. Frames are sampled
//! in parallel, but results are always returned in frame
//! (ascending timestamp) order.
//!
//! Sampling never fails as a whole: a frame that cannot be
//! decoded, a point off the grid or a region without cells
//! yields NaN for the affected values, and a
//! [`SampleWarning`] describing why.
use chrono::NaiveDateTime;
use itertools::Itertools;
use ndarray::{Array2, Zip};
use rayon::prelude::*;
use serde_derive::*;
use tracing::{debug, warn};

use crate::{
    error::ThermalError,
    frame::{FrameEntry, FrameSequence, Shape},
    mask::{self, Coord},
    selection::{PointSet, Polygon, Selection},
    source::FrameSource,
};

/// Per-frame mean / min / max of a region.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct RegionStats {
    pub mean: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Values of a [`TimeSeries`], keyed by what was selected.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum SeriesValues {
    /// One series per point, indexed by point index.
    Points(Vec<Vec<f64>>),
    Region(RegionStats),
}

/// Series aligned with a list of timestamps. Every series has
/// exactly one value per timestamp.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDateTime>,
    values: SeriesValues,
}

impl TimeSeries {
    /// Returns `None` if any series is not aligned with
    /// `timestamps`.
    pub fn new(timestamps: Vec<NaiveDateTime>, values: SeriesValues) -> Option<Self> {
        let series = TimeSeries { timestamps, values };
        if series.columns().all(|(_, v)| v.len() == series.timestamps.len()) {
            Some(series)
        } else {
            None
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &SeriesValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Named series in a fixed order: `Point_1..Point_n`
    /// (1-based) or the three region statistics.
    pub fn columns(&self) -> impl Iterator<Item = (String, &[f64])> + '_ {
        let cols: Vec<(String, &[f64])> = match &self.values {
            SeriesValues::Points(points) => points
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("Point_{}", i + 1), v.as_slice()))
                .collect(),
            SeriesValues::Region(stats) => vec![
                ("Mean_Temperature".to_string(), stats.mean.as_slice()),
                ("Min_Temperature".to_string(), stats.min.as_slice()),
                ("Max_Temperature".to_string(), stats.max.as_slice()),
            ],
        };
        cols.into_iter()
    }

    pub(crate) fn from_parts(timestamps: Vec<NaiveDateTime>, values: SeriesValues) -> Self {
        TimeSeries { timestamps, values }
    }
}

/// Why a sample was replaced by NaN.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SampleWarning {
    /// Index of the frame in the sequence.
    pub frame: usize,
    pub frame_id: String,
    /// Point index, for point selections.
    pub point: Option<usize>,
    #[serde(serialize_with = "serde_helpers::display")]
    pub error: ThermalError,
}

/// A built series together with the warnings collected
/// while sampling.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SeriesReport {
    pub series: TimeSeries,
    pub warnings: Vec<SampleWarning>,
}

impl SeriesReport {
    /// Warnings that concern `frame`.
    pub fn warnings_for_frame(&self, frame: usize) -> impl Iterator<Item = &SampleWarning> {
        self.warnings.iter().filter(move |w| w.frame == frame)
    }
}

/// Build the series for any selection.
pub fn build_series<S>(source: &S, frames: &FrameSequence, selection: &Selection) -> SeriesReport
where
    S: FrameSource + Sync,
{
    match selection {
        Selection::Points(points) => build_point_series(source, frames, points),
        Selection::Polygon(polygon) => build_region_series(source, frames, polygon),
    }
}

/// Temperature at each point, for every frame.
///
/// Points are rounded to the nearest cell. Off-grid points,
/// points with a non-finite coordinate and undecodable frames
/// produce NaN.
pub fn build_point_series<S>(source: &S, frames: &FrameSequence, points: &PointSet) -> SeriesReport
where
    S: FrameSource + Sync,
{
    let cells: Vec<(Coord, Option<(i64, i64)>)> =
        points.iter().map(|p| (p.coord, p.cell())).collect();
    debug!(points = cells.len(), frames = frames.len(), "building point series");

    let per_frame: Vec<(Vec<f64>, Vec<SampleWarning>)> = frames
        .entries()
        .par_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let grid = match frames.decode(source, entry) {
                Ok(grid) => grid,
                Err(error) => {
                    let warning = frame_warning(idx, entry, None, error);
                    return (vec![f64::NAN; cells.len()], vec![warning]);
                }
            };

            let shape = Shape::of(&grid);
            let mut warnings = vec![];
            let values = cells
                .iter()
                .enumerate()
                .map(|(point, &(coord, cell))| match cell {
                    Some((row, col)) if shape.contains(row, col) => {
                        grid[(row as usize, col as usize)]
                    }
                    _ => {
                        let error = ThermalError::OutOfBounds {
                            x: coord.x,
                            y: coord.y,
                            shape,
                        };
                        warnings.push(frame_warning(idx, entry, Some(point), error));
                        f64::NAN
                    }
                })
                .collect();
            (values, warnings)
        })
        .collect();

    let mut series = vec![Vec::with_capacity(frames.len()); cells.len()];
    let mut warnings = vec![];
    for (values, frame_warnings) in per_frame {
        for (s, v) in series.iter_mut().zip(values) {
            s.push(v);
        }
        warnings.extend(frame_warnings);
    }

    SeriesReport {
        series: TimeSeries::from_parts(frames.timestamps(), SeriesValues::Points(series)),
        warnings,
    }
}

/// Mean, minimum and maximum over the cells of `polygon`, for
/// every frame.
///
/// The mask is computed once for the sequence shape. NaN
/// cells inside the region are ignored; a frame without any
/// finite cell in the region produces NaN for all three.
pub fn build_region_series<S>(source: &S, frames: &FrameSequence, polygon: &Polygon) -> SeriesReport
where
    S: FrameSource + Sync,
{
    let mask = polygon.mask(frames.shape());
    debug!(
        cells = mask::count(&mask),
        frames = frames.len(),
        "building region series"
    );

    let per_frame: Vec<(Option<Stats>, Option<SampleWarning>)> = frames
        .entries()
        .par_iter()
        .enumerate()
        .map(|(idx, entry)| match frames.decode(source, entry) {
            Ok(grid) => match region_stats(&grid, &mask) {
                Some(stats) => (Some(stats), None),
                None => {
                    let warning = frame_warning(idx, entry, None, ThermalError::EmptyRegion);
                    (None, Some(warning))
                }
            },
            Err(error) => (None, Some(frame_warning(idx, entry, None, error))),
        })
        .collect();

    let mut stats = RegionStats::default();
    let mut warnings = vec![];
    for (frame_stats, warning) in per_frame {
        let s = frame_stats.unwrap_or(Stats::MISSING);
        stats.mean.push(s.mean);
        stats.min.push(s.min);
        stats.max.push(s.max);
        warnings.extend(warning);
    }

    SeriesReport {
        series: TimeSeries::from_parts(frames.timestamps(), SeriesValues::Region(stats)),
        warnings,
    }
}

#[derive(Debug, Clone, Copy)]
struct Stats {
    mean: f64,
    min: f64,
    max: f64,
}

impl Stats {
    const MISSING: Stats = Stats {
        mean: f64::NAN,
        min: f64::NAN,
        max: f64::NAN,
    };
}

fn region_stats(grid: &Array2<f64>, mask: &Array2<bool>) -> Option<Stats> {
    let mut selected = Vec::new();
    Zip::from(grid).and(mask).for_each(|&v, &m| {
        if m && !v.is_nan() {
            selected.push(v);
        }
    });

    let (min, max) = selected
        .iter()
        .copied()
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()?;
    let mean = selected.iter().sum::<f64>() / selected.len() as f64;
    Some(Stats { mean, min, max })
}

fn frame_warning(
    frame: usize,
    entry: &FrameEntry,
    point: Option<usize>,
    error: ThermalError,
) -> SampleWarning {
    warn!(frame = %entry.id, point = ?point, "{}", error);
    SampleWarning {
        frame,
        frame_id: entry.id.clone(),
        point,
        error,
    }
}

mod serde_helpers {
    use serde::Serializer;
    use std::fmt::Display;

    pub fn display<T: Display, S: Serializer>(value: &T, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(value)
    }
}
