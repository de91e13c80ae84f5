//! Analysis settings.
//!
//! Every field has a default, so a JSON config file only
//! needs to list what it changes:
//!
//! ```json
//! { "camera": "generic", "low_percentile": 5 }
//! ```
use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde_derive::*;

use crate::{
    delta::check_window,
    error::ThermalError,
    range::PercentileBounds,
    source::CameraType,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub camera: CameraType,
    pub low_percentile: f64,
    pub high_percentile: f64,
    /// Default delta window, in frames.
    pub window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let bounds = PercentileBounds::default();
        AnalysisConfig {
            camera: CameraType::default(),
            low_percentile: bounds.low,
            high_percentile: bounds.high,
            window: 2,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn bounds(&self) -> PercentileBounds {
        PercentileBounds {
            low: self.low_percentile,
            high: self.high_percentile,
        }
    }

    pub fn validate(&self) -> Result<(), ThermalError> {
        self.bounds().validate()?;
        if self.window == 0 {
            return Err(ThermalError::InvalidWindow);
        }
        Ok(())
    }

    /// Check `window` against a series of `len` samples.
    pub fn check_window(&self, len: usize) -> Result<(), ThermalError> {
        check_window(len, self.window)
    }
}
