//! Contiguous-run detection over a monotonically increasing counter.
//!
//! Fed with a sparse log of only the lost packet numbers, each closed run
//! brackets one burst of contiguous loss, ready to be shaded on a chart.

use crate::parser::Timestamp;
use crate::utils::error::SeriesError;
use log::debug;
use serde::Serialize;

/// One maximal contiguous run, from its first to its last point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunInterval {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Find the closed contiguous runs of a time-ordered counter series
///
/// A gap is a value more than one above the previous value. Each gap
/// closes the current run; single-point runs are not emitted, and the run
/// still open at the end of input is dropped.
///
/// The counter is seeded from the first point rather than a fixed zero,
/// so a counter that starts far above zero does not open with a gap.
///
/// # Errors
/// * `SeriesError::EmptySeries` - no points; `key` names the series in the error
pub fn detect_runs(key: &str, points: &[(Timestamp, f64)]) -> Result<Vec<RunInterval>, SeriesError> {
    let Some(&(first_time, first_value)) = points.first() else {
        return Err(SeriesError::EmptySeries {
            key: key.to_string(),
        });
    };

    if first_value > 1.0 {
        debug!(
            "{}: counter starts at {}, seeding from the first point instead of 0",
            key, first_value
        );
    }

    let mut runs = Vec::new();
    let mut last_value = first_value;
    let mut run_start = first_time;
    let mut previous_time = first_time;

    for &(time, value) in &points[1..] {
        if value > last_value + 1.0 {
            if run_start != previous_time {
                runs.push(RunInterval {
                    start: run_start,
                    end: previous_time,
                });
            }
            run_start = time;
        }
        previous_time = time;
        last_value = value;
    }

    debug!("{}: {} closed runs over {} points", key, runs.len(), points.len());
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(f64, f64)]) -> Vec<(Timestamp, f64)> {
        points
            .iter()
            .map(|&(t, v)| (Timestamp::new(t).unwrap(), v))
            .collect()
    }

    fn interval(start: f64, end: f64) -> RunInterval {
        RunInterval {
            start: Timestamp::new(start).unwrap(),
            end: Timestamp::new(end).unwrap(),
        }
    }

    #[test]
    fn test_two_bursts_and_trailing_point() {
        let points = series(&[
            (1.0, 1.0),
            (2.0, 2.0),
            (3.0, 2.0),
            (4.0, 5.0),
            (5.0, 6.0),
            (6.0, 6.0),
            (7.0, 9.0),
        ]);
        let runs = detect_runs("lost", &points).unwrap();
        assert_eq!(runs, vec![interval(1.0, 3.0), interval(4.0, 6.0)]);
    }

    #[test]
    fn test_isolated_points_emit_nothing() {
        let points = series(&[(1.0, 1.0), (2.0, 5.0), (3.0, 9.0), (4.0, 20.0)]);
        assert!(detect_runs("lost", &points).unwrap().is_empty());
    }

    #[test]
    fn test_open_run_is_dropped() {
        let points = series(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert!(detect_runs("lost", &points).unwrap().is_empty());
    }

    #[test]
    fn test_counter_starting_high() {
        let points = series(&[(10.0, 500.0), (11.0, 501.0), (12.0, 510.0)]);
        assert_eq!(detect_runs("lost", &points).unwrap(), vec![interval(10.0, 11.0)]);
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(
            detect_runs("lost", &[]),
            Err(SeriesError::EmptySeries {
                key: "lost".to_string()
            })
        );
    }

    #[test]
    fn test_single_point() {
        assert!(detect_runs("lost", &series(&[(1.0, 1.0)])).unwrap().is_empty());
    }
}
