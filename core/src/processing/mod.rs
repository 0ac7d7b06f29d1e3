pub mod aggregate;
pub mod counter;
pub mod density;
pub mod filters;

pub use aggregate::{calc_all_dens, DensityCube, DENSITY_DIMS};
pub use counter::{bin_count_tracks, CountBy};
pub use density::{compute_density, DensityMethod, DensityOptions, MonthDay};
pub use filters::{
    boundary_mask, check_by_mask, check_far_from_boundaries, exclude_by_first_day,
    exclude_by_last_day, BoundaryFilter, LonLatBox, MaskCheck, MaskFilter, MaskParams,
};
