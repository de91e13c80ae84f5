//! Fixed-lag differences of a time series.
//!
//! With window `w`, `delta[i] = series[i + w] - series[i]`,
//! aligned with `timestamps[w..]`. NaN inputs propagate: a
//! difference across a missing sample is itself missing.
use crate::{
    error::{Result, ThermalError},
    series::{RegionStats, SeriesValues, TimeSeries},
};

/// Check that a series of `len` samples supports `window`.
pub fn check_window(len: usize, window: usize) -> Result<()> {
    if window == 0 {
        return Err(ThermalError::InvalidWindow);
    }
    if len <= window {
        return Err(ThermalError::InsufficientData {
            window,
            available: len,
            required: window + 1,
        });
    }
    Ok(())
}

pub fn delta(series: &[f64], window: usize) -> Result<Vec<f64>> {
    check_window(series.len(), window)?;
    Ok(series
        .iter()
        .zip(&series[window..])
        .map(|(before, after)| after - before)
        .collect())
}

impl TimeSeries {
    pub fn supports_window(&self, window: usize) -> bool {
        check_window(self.len(), window).is_ok()
    }

    /// Delta of every series, aligned with
    /// `timestamps[window..]`.
    pub fn delta(&self, window: usize) -> Result<TimeSeries> {
        check_window(self.len(), window)?;

        let values = match self.values() {
            SeriesValues::Points(points) => SeriesValues::Points(
                points
                    .iter()
                    .map(|s| delta(s, window))
                    .collect::<Result<_>>()?,
            ),
            SeriesValues::Region(stats) => SeriesValues::Region(RegionStats {
                mean: delta(&stats.mean, window)?,
                min: delta(&stats.min, window)?,
                max: delta(&stats.max, window)?,
            }),
        };

        Ok(TimeSeries::from_parts(
            self.timestamps()[window..].to_vec(),
            values,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(n: usize) -> Vec<NaiveDateTime> {
        (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, i as u32, 0)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn fixed_lag_difference() {
        let series = [10., 12., 15., 11.];
        assert_eq!(delta(&series, 2).unwrap(), vec![5., -1.]);
        assert_eq!(delta(&series, 1).unwrap(), vec![2., 3., -4.]);
        assert_eq!(delta(&series, 3).unwrap(), vec![1.]);
    }

    #[test]
    fn insufficient_data() {
        let series = [10., 12., 15., 11.];
        assert_eq!(
            delta(&series, 4).unwrap_err(),
            ThermalError::InsufficientData {
                window: 4,
                available: 4,
                required: 5
            }
        );
        assert_eq!(delta(&series, 0).unwrap_err(), ThermalError::InvalidWindow);
        assert!(check_window(5, 4).is_ok());
        assert!(check_window(4, 4).is_err());
    }

    #[test]
    fn nan_propagates() {
        let d = delta(&[1., f64::NAN, 4., 8.], 1).unwrap();
        assert!(d[0].is_nan() && d[1].is_nan());
        assert_eq!(d[2], 4.);
    }

    #[test]
    fn multi_series_delta_is_aligned() {
        let timestamps = ts(4);
        let series = TimeSeries::new(
            timestamps.clone(),
            SeriesValues::Points(vec![vec![10., 12., 15., 11.], vec![0., 1., 2., 3.]]),
        )
        .unwrap();

        assert!(series.supports_window(3));
        assert!(!series.supports_window(4));

        let d = series.delta(2).unwrap();
        assert_eq!(d.timestamps(), &timestamps[2..]);
        assert_eq!(
            d.values(),
            &SeriesValues::Points(vec![vec![5., -1.], vec![2., 2.]])
        );
    }

    #[test]
    fn region_delta_covers_all_stats() {
        let series = TimeSeries::new(
            ts(3),
            SeriesValues::Region(RegionStats {
                mean: vec![1., 2., 4.],
                min: vec![0., 0., 1.],
                max: vec![5., 7., 6.],
            }),
        )
        .unwrap();
        let d = series.delta(1).unwrap();
        assert_eq!(
            d.values(),
            &SeriesValues::Region(RegionStats {
                mean: vec![1., 2.],
                min: vec![0., 1.],
                max: vec![2., -1.],
            })
        );
        assert!(matches!(
            series.delta(3),
            Err(ThermalError::InsufficientData { .. })
        ));
    }
}
