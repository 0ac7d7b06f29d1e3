pub mod geodesy;
pub mod grid;
pub mod mask;

pub use geodesy::{GeoHelper, EARTH_RADIUS_M, KM2M};
pub use grid::{meshgrid, LandSeaMask, LonLatGrid};
pub use mask::mask_tracks;
