pub mod cyclone;
pub mod point;
pub mod run;

pub use cyclone::{Track, TrackRecord};
pub use point::TrackPoint;
pub use run::{RunConfig, TrackRun};
