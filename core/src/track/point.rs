use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Single timestamped position along a cyclone track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub time: NaiveDateTime,
    pub lon: f64,
    pub lat: f64,
}

impl TrackPoint {
    pub fn new(time: NaiveDateTime, lon: f64, lat: f64) -> Self {
        Self { time, lon, lat }
    }

    pub fn month(&self) -> u32 {
        self.time.month()
    }

    pub fn day(&self) -> u32 {
        self.time.day()
    }

    pub fn year(&self) -> i32 {
        self.time.year()
    }
}
