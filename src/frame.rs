//! Timestamped frame sequences.
//!
//! A [`FrameSequence`] is the ordered list of frames loaded
//! into a session. It stores only the identifiers and
//! timestamps; grids are decoded on demand through a
//! [`FrameSource`] so that every query is a full recompute
//! over the current files.
use std::fmt;

use chrono::NaiveDateTime;
use ndarray::Array2;
use rayon::prelude::*;
use serde_derive::*;
use tracing::{debug, info};

use crate::{
    error::{Result, ThermalError},
    range::{frame_percentiles, DisplayRange, PercentileBounds, RangeAccumulator},
    source::{CameraType, FrameSource},
};

/// Grid shape as `(rows, cols)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    pub fn of<T>(grid: &Array2<T>) -> Self {
        let (rows, cols) = grid.dim();
        Shape { rows, cols }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether the signed cell index `(row, col)` lies on
    /// the grid.
    pub fn contains(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// One frame of a sequence: the identifier handed to the
/// [`FrameSource`] and the timestamp derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntry {
    pub id: String,
    pub timestamp: NaiveDateTime,
}

/// Frames of a session sorted ascending by timestamp, all
/// sharing one grid shape.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    entries: Vec<FrameEntry>,
    shape: Shape,
    camera: CameraType,
}

/// What [`FrameSequence::load`] reports back to the caller.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct LoadSummary {
    pub frames: usize,
    pub shape: Shape,
    pub camera: CameraType,
    pub range: DisplayRange,
}

impl FrameSequence {
    /// Build a sequence from already known entries. Entries
    /// are sorted by timestamp; duplicate timestamps are
    /// rejected.
    pub fn new(mut entries: Vec<FrameEntry>, shape: Shape, camera: CameraType) -> Result<Self> {
        if entries.is_empty() {
            return Err(ThermalError::EmptySequence);
        }
        entries.sort_by_key(|e| e.timestamp);
        if let Some(w) = entries.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(ThermalError::Timestamp {
                id: w[1].id.clone(),
                message: format!("duplicate timestamp {} (also `{}`)", w[1].timestamp, w[0].id),
            });
        }
        Ok(FrameSequence {
            entries,
            shape,
            camera,
        })
    }

    /// Load a sequence from frame identifiers.
    ///
    /// Every timestamp is extracted first; a single failure
    /// aborts the load before any frame is decoded. The
    /// frames are then decoded once each to validate the
    /// common shape and compute the [`DisplayRange`].
    pub fn load<S, I>(
        source: &S,
        ids: I,
        camera: CameraType,
        bounds: PercentileBounds,
    ) -> Result<(Self, LoadSummary)>
    where
        S: FrameSource + Sync,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::load_with_progress(source, ids, camera, bounds, || {})
    }

    /// Same as [`load`][Self::load], calling `on_frame` once
    /// per decoded frame.
    pub fn load_with_progress<S, I, F>(
        source: &S,
        ids: I,
        camera: CameraType,
        bounds: PercentileBounds,
        on_frame: F,
    ) -> Result<(Self, LoadSummary)>
    where
        S: FrameSource + Sync,
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn() + Sync,
    {
        bounds.validate()?;

        let entries = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                let timestamp = source
                    .extract_timestamp(&id)
                    .map_err(|e| ThermalError::Timestamp {
                        id: id.clone(),
                        message: format!("{:#}", e),
                    })?;
                Ok(FrameEntry { id, timestamp })
            })
            .collect::<Result<Vec<_>>>()?;

        // The earliest frame sets the shape every frame must have.
        let mut sequence = Self::new(entries, Shape::new(0, 0), camera)?;
        let first = &sequence.entries[0].id;
        let shape = source
            .dimensions(first, camera)
            .map_err(|e| ThermalError::frame_decode(first, &e))?;
        sequence.shape = shape;

        let decoded = sequence
            .entries
            .par_iter()
            .map(|entry| -> Result<_> {
                let grid = source
                    .load(&entry.id, camera)
                    .map_err(|e| ThermalError::frame_decode(&entry.id, &e))?;
                Ok((Shape::of(&grid), frame_percentiles(grid.view(), bounds)))
            })
            .inspect(|_| on_frame())
            .collect::<Result<Vec<_>>>()?;

        let mut acc = RangeAccumulator::default();
        for (entry, (found, percentiles)) in sequence.entries.iter().zip(decoded) {
            if found != shape {
                return Err(ThermalError::ShapeMismatch {
                    frame: entry.id.clone(),
                    expected: shape,
                    found,
                });
            }
            match percentiles {
                Some(p) => acc += p,
                None => debug!(frame = %entry.id, "frame has no finite samples"),
            }
        }
        let range = acc.finish()?;

        let summary = LoadSummary {
            frames: sequence.len(),
            shape,
            camera,
            range,
        };
        info!(
            frames = summary.frames,
            shape = %shape,
            camera = %camera,
            low = range.low,
            high = range.high,
            "loaded frame sequence"
        );
        Ok((sequence, summary))
    }

    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.entries.iter().map(|e| e.timestamp).collect()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn camera(&self) -> CameraType {
        self.camera
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode one frame, checking it still has the session
    /// shape.
    pub(crate) fn decode<S: FrameSource>(&self, source: &S, entry: &FrameEntry) -> Result<Array2<f64>> {
        let grid = source
            .load(&entry.id, self.camera)
            .map_err(|e| ThermalError::frame_decode(&entry.id, &e))?;
        let found = Shape::of(&grid);
        if found != self.shape {
            return Err(ThermalError::ShapeMismatch {
                frame: entry.id.clone(),
                expected: self.shape,
                found,
            });
        }
        Ok(grid)
    }
}
