use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::track::{Track, TrackRun};

/// Kind of track-derived event binned into a density grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityType {
    /// Every track point.
    Point,
    /// Track passages, each track counted at most once per cell.
    Track,
    /// First point of each track.
    Genesis,
    /// Last point of each track.
    Lysis,
}

/// All density types in their canonical order.
pub const DENSITY_TYPES: [DensityType; 4] = [
    DensityType::Point,
    DensityType::Track,
    DensityType::Genesis,
    DensityType::Lysis,
];

impl DensityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DensityType::Point => "point",
            DensityType::Track => "track",
            DensityType::Genesis => "genesis",
            DensityType::Lysis => "lysis",
        }
    }
}

impl fmt::Display for DensityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DensityType {
    type Err = DensityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(DensityType::Point),
            "track" => Ok(DensityType::Track),
            "genesis" => Ok(DensityType::Genesis),
            "lysis" => Ok(DensityType::Lysis),
            other => Err(DensityError::Argument(format!(
                "unknown density type `{}`",
                other
            ))),
        }
    }
}

/// Common error type for density and filtering routines.
#[derive(thiserror::Error, Debug)]
pub enum DensityError {
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("invalid land-sea mask: {0}")]
    InvalidMask(String),
    #[error("invalid grid: {0}")]
    Grid(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type DensityResult<T> = Result<T, DensityError>;

/// Predicate used to sort tracks of a run into named categories.
pub trait TrackFilter {
    fn check(&self, track: &Track, run: &TrackRun) -> DensityResult<bool>;
}

impl<F> TrackFilter for F
where
    F: Fn(&Track, &TrackRun) -> DensityResult<bool>,
{
    fn check(&self, track: &Track, run: &TrackRun) -> DensityResult<bool> {
        self(track, run)
    }
}
