use anyhow::Context;
use std::fs;
use std::path::Path;
use trackdens::{LandSeaMask, Track};

/// Reads a JSON array of tracks, validating each one.
pub fn load_tracks<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Track>> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading tracks {}", path_ref.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing tracks {}", path_ref.display()))
}

/// Reads a JSON land-sea mask with `longitude`, `latitude` and 2D `values`.
pub fn load_land_sea_mask<P: AsRef<Path>>(path: P) -> anyhow::Result<LandSeaMask> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading land-sea mask {}", path_ref.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parsing land-sea mask {}", path_ref.display()))
}
