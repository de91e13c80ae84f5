//! Global display range across a frame sequence.
//!
//! For every frame the `low`-th and `high`-th percentiles
//! are computed; the display range is the envelope of these
//! (smallest low, largest high), rounded to integers. This
//! keeps every frame's typical range visible on one scale
//! without letting a single outlier pixel dominate.
use std::ops::AddAssign;

use ndarray::ArrayView2;
use serde_derive::*;

use crate::error::{Result, ThermalError};

/// Percentiles used for the per-frame range, in `[0, 100]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PercentileBounds {
    pub low: f64,
    pub high: f64,
}

impl Default for PercentileBounds {
    fn default() -> Self {
        PercentileBounds {
            low: 15.,
            high: 95.,
        }
    }
}

impl PercentileBounds {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let bounds = PercentileBounds { low, high };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |p: f64| (0. ..=100.).contains(&p);
        if in_range(self.low) && in_range(self.high) && self.low <= self.high {
            Ok(())
        } else {
            Err(ThermalError::InvalidPercentile {
                low: self.low,
                high: self.high,
            })
        }
    }
}

/// Low / high bounds used to put every frame of a session on
/// the same color scale.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub low: f64,
    pub high: f64,
}

impl DisplayRange {
    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Map a temperature to `[0, 1]`, clamping values outside
    /// the range. NaN maps to NaN; a zero-width range maps
    /// everything at or above `low` to 1.
    pub fn normalize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        let span = self.span();
        if span <= 0. {
            return if value >= self.low { 1. } else { 0. };
        }
        ((value - self.low) / span).max(0.).min(1.)
    }
}

/// Percentile of ascending `sorted` with linear interpolation
/// between the closest ranks (the usual `numpy` definition).
fn percentile_of_sorted(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100. * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Low and high percentile of one frame's finite samples.
/// `None` if the frame has no finite samples.
pub fn frame_percentiles(grid: ArrayView2<f64>, bounds: PercentileBounds) -> Option<(f64, f64)> {
    let mut values: Vec<f64> = grid.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    Some((
        percentile_of_sorted(&values, bounds.low),
        percentile_of_sorted(&values, bounds.high),
    ))
}

/// Running envelope of per-frame percentiles.
#[derive(Debug, Clone, Copy)]
pub struct RangeAccumulator {
    low: f64,
    high: f64,
    frames: usize,
}

impl Default for RangeAccumulator {
    fn default() -> Self {
        RangeAccumulator {
            low: f64::INFINITY,
            high: f64::NEG_INFINITY,
            frames: 0,
        }
    }
}

impl AddAssign<(f64, f64)> for RangeAccumulator {
    fn add_assign(&mut self, (low, high): (f64, f64)) {
        self.low = self.low.min(low);
        self.high = self.high.max(high);
        self.frames += 1;
    }
}

impl AddAssign<&RangeAccumulator> for RangeAccumulator {
    fn add_assign(&mut self, other: &RangeAccumulator) {
        self.low = self.low.min(other.low);
        self.high = self.high.max(other.high);
        self.frames += other.frames;
    }
}

impl RangeAccumulator {
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Round the envelope to integers (ties to even).
    pub fn finish(&self) -> Result<DisplayRange> {
        if self.frames == 0 {
            return Err(ThermalError::EmptySequence);
        }
        Ok(DisplayRange {
            low: self.low.round_ties_even(),
            high: self.high.round_ties_even(),
        })
    }
}

/// Display range of a sequence of grids.
pub fn compute_range<'a, I>(frames: I, bounds: PercentileBounds) -> Result<DisplayRange>
where
    I: IntoIterator<Item = ArrayView2<'a, f64>>,
{
    bounds.validate()?;
    let mut acc = RangeAccumulator::default();
    for grid in frames {
        if let Some(p) = frame_percentiles(grid, bounds) {
            acc += p;
        }
    }
    acc.finish()
}
