//! Density fields and classification filters for cyclone-track datasets.
//!
//! Tracks are binned onto lon/lat grids by subset and event type, counted per
//! month or winter season, and filtered by their proximity to land and to the
//! edges of the tracking domain.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod track;

pub use math::{LandSeaMask, LonLatGrid};
pub use prelude::{DensityError, DensityResult, DensityType, TrackFilter, DENSITY_TYPES};
pub use processing::{
    bin_count_tracks, calc_all_dens, check_by_mask, check_far_from_boundaries, CountBy,
    DensityCube, DensityMethod, DensityOptions, LonLatBox, MaskParams,
};
pub use track::{RunConfig, Track, TrackPoint, TrackRun};
