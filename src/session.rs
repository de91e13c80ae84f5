//! An analysis session: one loaded frame sequence and at most
//! one active selection.
//!
//! Every query recomputes from scratch; nothing derived from
//! the selection is cached.
use tracing::debug;

use crate::{
    config::AnalysisConfig,
    error::{Result, ThermalError},
    frame::{FrameSequence, LoadSummary},
    mask::Coord,
    range::DisplayRange,
    selection::{PointSet, Polygon, Selection},
    series::{build_series, SeriesReport, TimeSeries},
    source::FrameSource,
};

pub struct Session<S> {
    source: S,
    frames: FrameSequence,
    summary: LoadSummary,
    selection: Option<Selection>,
}

impl<S: FrameSource + Sync> Session<S> {
    pub fn load<I>(source: S, ids: I, config: &AnalysisConfig) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::load_with_progress(source, ids, config, || {})
    }

    pub fn load_with_progress<I, F>(
        source: S,
        ids: I,
        config: &AnalysisConfig,
        on_frame: F,
    ) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn() + Sync,
    {
        config.validate()?;
        let (frames, summary) =
            FrameSequence::load_with_progress(&source, ids, config.camera, config.bounds(), on_frame)?;
        Ok(Session {
            source,
            frames,
            summary,
            selection: None,
        })
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    pub fn range(&self) -> DisplayRange {
        self.summary.range
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Add a probe point, discarding a polygon selection if
    /// one is active. Returns the point index.
    pub fn add_point(&mut self, coord: impl Into<Coord>) -> usize {
        match &mut self.selection {
            Some(Selection::Points(points)) => points.push(coord),
            _ => {
                if self.selection.is_some() {
                    debug!("replacing polygon selection with points");
                }
                let mut points = PointSet::new();
                let index = points.push(coord);
                self.selection = Some(Selection::Points(points));
                index
            }
        }
    }

    /// Replace the selection with a polygon.
    pub fn set_polygon<I>(&mut self, vertices: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Coord>,
    {
        let polygon = Polygon::new(vertices)?;
        self.selection = Some(Selection::Polygon(polygon));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Build the series of the current selection.
    pub fn series(&self) -> Result<SeriesReport> {
        let selection = self.selection.as_ref().ok_or(ThermalError::NoSelection)?;
        Ok(build_series(&self.source, &self.frames, selection))
    }

    /// Delta series of the current selection.
    pub fn delta(&self, window: usize) -> Result<TimeSeries> {
        crate::delta::check_window(self.frames.len(), window)?;
        self.series()?.series.delta(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{series::SeriesValues, source::MemorySource};
    use chrono::{NaiveDate, NaiveDateTime};
    use ndarray::Array;

    fn ts(min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, min, 0)
            .unwrap()
    }

    fn session() -> Session<MemorySource> {
        let mut source = MemorySource::default();
        for (i, v) in [10., 12., 15., 11.].iter().enumerate() {
            source.insert(format!("f{}", i), ts(i as u32), Array::from_elem((4, 4), *v));
        }
        let ids: Vec<String> = vec!["f3", "f1", "f0", "f2"].into_iter().map(String::from).collect();
        Session::load(source, ids, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn loads_and_orders() {
        let s = session();
        assert_eq!(s.frames().len(), 4);
        assert_eq!(s.frames().entries()[0].id, "f0");
        assert_eq!(s.range(), DisplayRange { low: 10., high: 15. });
        assert!(s.selection().is_none());
        assert_eq!(s.series().unwrap_err(), ThermalError::NoSelection);
    }

    #[test]
    fn points_accumulate_until_mode_change() {
        let mut s = session();
        assert_eq!(s.add_point((1., 1.)), 0);
        assert_eq!(s.add_point((2., 2.)), 1);

        let report = s.series().unwrap();
        match report.series.values() {
            SeriesValues::Points(p) => {
                assert_eq!(p.len(), 2);
                assert_eq!(p[0], vec![10., 12., 15., 11.]);
            }
            _ => panic!("expected point series"),
        }

        s.set_polygon(vec![(0., 0.), (3., 0.), (3., 3.)]).unwrap();
        assert!(matches!(s.selection(), Some(Selection::Polygon(_))));

        // Switching back starts a fresh point set.
        assert_eq!(s.add_point((0., 0.)), 0);
        s.clear_selection();
        assert!(s.selection().is_none());
    }

    #[test]
    fn invalid_polygon_keeps_selection() {
        let mut s = session();
        s.add_point((1., 1.));
        assert!(s.set_polygon(vec![(0., 0.), (1., 1.)]).is_err());
        assert!(matches!(s.selection(), Some(Selection::Points(_))));
    }

    #[test]
    fn delta_of_selection() {
        let mut s = session();
        s.add_point((1., 1.));
        let d = s.delta(2).unwrap();
        assert_eq!(d.values(), &SeriesValues::Points(vec![vec![5., -1.]]));
        assert_eq!(d.timestamps(), &[ts(2), ts(3)]);
        assert!(matches!(
            s.delta(4),
            Err(ThermalError::InsufficientData { required: 5, .. })
        ));
    }
}
