use chrono::Duration;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::prelude::{DensityError, DensityResult};
use crate::track::point::TrackPoint;

/// Raw form of a track as it appears in serialized input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: usize,
    pub points: Vec<TrackPoint>,
}

/// Cyclone track: a non-empty, time-ordered sequence of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackRecord")]
pub struct Track {
    id: usize,
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(id: usize, points: Vec<TrackPoint>) -> DensityResult<Self> {
        if points.is_empty() {
            return Err(DensityError::Argument(format!("track {} has no points", id)));
        }
        if let Some(pos) = points.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(DensityError::Argument(format!(
                "track {} goes back in time at point {}",
                id,
                pos + 1
            )));
        }
        Ok(Self { id, points })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn lon(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.lon).collect()
    }

    pub fn lat(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.lat).collect()
    }

    /// Contiguous `(n, 2)` buffer of `[lon, lat]` rows.
    pub fn lonlat_c(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.points.len(), 2), |(i, j)| {
            let p = &self.points[i];
            if j == 0 {
                p.lon
            } else {
                p.lat
            }
        })
    }

    pub fn genesis(&self) -> &TrackPoint {
        &self.points[0]
    }

    pub fn lysis(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }

    pub fn lifetime(&self) -> Duration {
        self.lysis().time - self.genesis().time
    }

    /// Months touched by the track, deduplicated in order of appearance.
    pub fn unique_months(&self) -> Vec<u32> {
        unique_in_order(self.points.iter().map(TrackPoint::month))
    }

    /// Years touched by the track, deduplicated in order of appearance.
    pub fn unique_years(&self) -> Vec<i32> {
        unique_in_order(self.points.iter().map(TrackPoint::year))
    }

    pub fn starts_on(&self, month: u32, day: u32) -> bool {
        let first = self.genesis();
        first.month() == month && first.day() == day
    }

    pub fn ends_on(&self, month: u32, day: u32) -> bool {
        let last = self.lysis();
        last.month() == month && last.day() == day
    }
}

impl TryFrom<TrackRecord> for Track {
    type Error = DensityError;

    fn try_from(record: TrackRecord) -> Result<Self, Self::Error> {
        Track::new(record.id, record.points)
    }
}

fn unique_in_order<T: PartialEq + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn track_rejects_empty_and_unordered_points() {
        assert!(Track::new(1, vec![]).is_err());
        let points = vec![
            TrackPoint::new(at(2001, 1, 2, 0), 0.0, 70.0),
            TrackPoint::new(at(2001, 1, 1, 0), 1.0, 70.0),
        ];
        assert!(matches!(
            Track::new(1, points),
            Err(DensityError::Argument(_))
        ));
    }

    #[test]
    fn unique_months_follow_order_of_appearance() {
        let points = vec![
            TrackPoint::new(at(2000, 12, 31, 12), 0.0, 70.0),
            TrackPoint::new(at(2001, 1, 1, 0), 1.0, 70.5),
            TrackPoint::new(at(2001, 1, 1, 6), 2.0, 71.0),
        ];
        let track = Track::new(7, points).unwrap();
        assert_eq!(track.unique_months(), vec![12, 1]);
        assert_eq!(track.unique_years(), vec![2000, 2001]);
        assert_eq!(track.lifetime(), Duration::hours(18));
    }

    #[test]
    fn lonlat_buffer_is_row_major_pairs() {
        let points = vec![
            TrackPoint::new(at(2001, 3, 1, 0), -5.0, 65.0),
            TrackPoint::new(at(2001, 3, 1, 3), -4.0, 66.0),
        ];
        let track = Track::new(0, points).unwrap();
        let buf = track.lonlat_c();
        assert!(buf.is_standard_layout());
        assert_eq!(buf.row(1).to_vec(), vec![-4.0, 66.0]);
        assert!(track.starts_on(3, 1));
        assert!(!track.ends_on(3, 2));
    }

    #[test]
    fn deserialization_validates_points() {
        let json = r#"{"id": 3, "points": []}"#;
        assert!(serde_json::from_str::<Track>(json).is_err());

        let json = r#"{"id": 3, "points": [{"time": "2001-03-01T00:00:00", "lon": 1.0, "lat": 70.0}]}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.id(), 3);
        assert_eq!(track.len(), 1);
    }
}
