use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::prelude::DensityError;
use crate::telemetry::progress::ProgressRecorder;
use crate::track::run::TrackRun;

/// Last month (inclusive) that closes a winter in the year it ends.
const WINTER_END_MONTH: u32 = 6;

/// Granularity of [`bin_count_tracks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountBy {
    /// Twelve calendar-month buckets.
    #[serde(alias = "M", alias = "m")]
    Month,
    /// One bucket per winter season.
    #[serde(alias = "W", alias = "w")]
    Winter,
}

impl FromStr for CountBy {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "M" => Ok(CountBy::Month),
            "W" => Ok(CountBy::Winter),
            other => Err(DensityError::Argument(format!(
                "granularity must be `M` or `W`, got `{}`",
                other
            ))),
        }
    }
}

/// Counts tracks per calendar month or per winter season.
///
/// In month mode every distinct month a track touches gets one count. In
/// winter mode bucket `i` covers the winter ending in `start_year + 1 + i`:
/// a track whose last active month is at most June is matched on its first
/// year against `start_year + 1 + i`, otherwise on its last year against
/// `start_year + i`. Tracks outside the window are not counted.
pub fn bin_count_tracks(
    run: &TrackRun,
    start_year: i32,
    n_winters: usize,
    by: CountBy,
) -> Array1<usize> {
    let mut progress = ProgressRecorder::new("tracks", run.len());
    let counter = match by {
        CountBy::Month => {
            let mut counter = Array1::zeros(12);
            for track in run {
                for month in track.unique_months() {
                    counter[month as usize - 1] += 1;
                }
                progress.tick(&track.id().to_string());
            }
            counter
        }
        CountBy::Winter => {
            let mut counter = Array1::zeros(n_winters);
            for track in run {
                let months = track.unique_months();
                let years = track.unique_years();
                let (Some(&last_month), Some(&first_year), Some(&last_year)) =
                    (months.last(), years.first(), years.last())
                else {
                    continue;
                };
                for (i, bucket) in counter.iter_mut().enumerate() {
                    let year = i64::from(start_year) + i as i64;
                    let hit = if last_month <= WINTER_END_MONTH {
                        i64::from(first_year) == year + 1
                    } else {
                        i64::from(last_year) == year
                    };
                    if hit {
                        *bucket += 1;
                    }
                }
                progress.tick(&track.id().to_string());
            }
            counter
        }
    };
    progress.finish();
    counter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{RunConfig, Track, TrackPoint};
    use chrono::NaiveDate;

    fn track(id: usize, dates: &[(i32, u32, u32)]) -> Track {
        let points = dates
            .iter()
            .map(|&(y, m, d)| {
                let time = NaiveDate::from_ymd_opt(y, m, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap();
                TrackPoint::new(time, 0.0, 70.0)
            })
            .collect();
        Track::new(id, points).unwrap()
    }

    fn run(tracks: Vec<Track>) -> TrackRun {
        TrackRun::new(tracks, RunConfig::default())
    }

    #[test]
    fn march_track_fills_only_march() {
        let counts = bin_count_tracks(
            &run(vec![track(0, &[(2001, 3, 1), (2001, 3, 2), (2001, 3, 3)])]),
            2000,
            3,
            CountBy::Month,
        );
        let mut expected = Array1::zeros(12);
        expected[2] = 1;
        assert_eq!(counts, expected);
    }

    #[test]
    fn multi_month_track_counts_each_month_once() {
        let counts = bin_count_tracks(
            &run(vec![track(0, &[(2001, 3, 30), (2001, 3, 31), (2001, 4, 1)])]),
            2000,
            3,
            CountBy::Month,
        );
        assert_eq!(counts[2], 1);
        assert_eq!(counts[3], 1);
        assert_eq!(counts.sum(), 2);
    }

    #[test]
    fn winter_buckets_follow_last_active_month() {
        let spring = track(0, &[(2001, 3, 1), (2001, 3, 2)]);
        let autumn = track(1, &[(2002, 10, 1), (2002, 10, 3)]);
        let counts = bin_count_tracks(&run(vec![spring, autumn]), 2000, 3, CountBy::Winter);
        assert_eq!(counts.to_vec(), vec![1, 0, 1]);
    }

    #[test]
    fn winter_spanning_new_year_uses_first_year() {
        let crossing = track(0, &[(2000, 12, 30), (2001, 1, 2)]);
        let counts = bin_count_tracks(&run(vec![crossing]), 2000, 2, CountBy::Winter);
        assert_eq!(counts.to_vec(), vec![0, 0]);

        let crossing = track(0, &[(2001, 12, 30), (2002, 1, 2)]);
        let counts = bin_count_tracks(&run(vec![crossing]), 2000, 2, CountBy::Winter);
        assert_eq!(counts.to_vec(), vec![1, 0]);
    }

    #[test]
    fn tracks_outside_window_are_dropped() {
        let early = track(0, &[(1990, 2, 1)]);
        let late = track(1, &[(2030, 11, 1)]);
        let counts = bin_count_tracks(&run(vec![early, late]), 2000, 3, CountBy::Winter);
        assert_eq!(counts.sum(), 0);
    }

    #[test]
    fn window_near_year_limit_does_not_overflow() {
        let spring = track(0, &[(2001, 3, 1)]);
        let counts = bin_count_tracks(&run(vec![spring]), i32::MAX - 1, 4, CountBy::Winter);
        assert_eq!(counts.sum(), 0);
    }

    #[test]
    fn granularity_flag_is_validated() {
        assert_eq!("m".parse::<CountBy>().unwrap(), CountBy::Month);
        assert_eq!("W".parse::<CountBy>().unwrap(), CountBy::Winter);
        assert!(matches!(
            "Y".parse::<CountBy>(),
            Err(DensityError::Argument(_))
        ));
    }
}
