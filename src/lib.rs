//! Extract temperature time series from sequences of thermal
//! frames.
//!
//! A session loads a finite list of timestamped temperature
//! grids (e.g. radiometric CSV exports) and answers queries
//! about how temperature evolves at user-chosen locations:
//!
//! 1. a global [display range](range) over all frames, from
//! per-frame percentiles;
//! 2. per-frame samples at a set of [points](selection::PointSet),
//! or mean / min / max over a [polygon](selection::Polygon)
//! via a [containment mask](mask::contains);
//! 3. fixed-lag [differences](delta) of any built series;
//! 4. [tabular export](export) of series and differences.
//!
//! # Usage
//!
//! ```rust,no_run
//! # fn run() -> anyhow::Result<()> {
//! use thermal_series::{AnalysisConfig, CsvFrameSource, Session};
//!
//! let paths = vec!["cam_2024-05-17_13-45-09.csv", "cam_2024-05-17_13-46-09.csv"];
//! let mut session = Session::load(CsvFrameSource, paths, &AnalysisConfig::default())?;
//! println!("display range: {:?}", session.range());
//!
//! session.add_point((120.4, 80.7));
//! let report = session.series()?;
//! thermal_series::export::write_csv(&report.series, std::io::stdout())?;
//!
//! let delta = session.delta(2)?;
//! # Ok(())
//! # }
//! ```
//!
//! Per-frame problems (unreadable files, points off the grid,
//! regions without cells) never abort a query. The affected
//! values are NaN and are listed in
//! [`SeriesReport::warnings`][series::SeriesReport::warnings].

pub mod error;
pub mod frame;
pub mod source;

pub mod range;
pub mod mask;
pub mod selection;
pub mod series;
pub mod delta;

pub mod config;
pub mod export;
pub mod session;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::config::AnalysisConfig;
pub use crate::error::ThermalError;
pub use crate::frame::{FrameSequence, Shape};
pub use crate::mask::Coord;
pub use crate::range::{compute_range, DisplayRange, PercentileBounds};
pub use crate::selection::{PointSet, Polygon, Selection};
pub use crate::series::{SeriesReport, SeriesValues, TimeSeries};
pub use crate::session::Session;
pub use crate::source::{CameraType, CsvFrameSource, FrameSource};
