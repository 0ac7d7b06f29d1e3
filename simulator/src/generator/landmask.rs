use anyhow::Context;
use ndarray::{Array1, Array2};
use trackdens::LandSeaMask;

/// Land-sea mask with a wavy north-south coastline: sea to the west, land to
/// the east, with a fractional transition `width` degrees wide.
pub fn coastal_land_sea_mask(
    lon: Array1<f64>,
    lat: Array1<f64>,
    coast_lon: f64,
    width: f64,
) -> anyhow::Result<LandSeaMask> {
    let width = width.max(f64::EPSILON);
    let values = Array2::from_shape_fn((lat.len(), lon.len()), |(i, j)| {
        let coast = coast_lon + 5.0 * (lat[i] * 6.0).to_radians().sin();
        ((lon[j] - coast) / width).clamp(0.0, 1.0)
    });
    LandSeaMask::new(lon, lat, values).context("building synthetic land-sea mask")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_sea_in_the_west_and_land_in_the_east() {
        let lon = Array1::range(-20.0, 51.0, 1.0);
        let lat = Array1::range(60.0, 86.0, 1.0);
        let lsm = coastal_land_sea_mask(lon, lat, 30.0, 2.0).unwrap();
        let values = lsm.values();
        assert_eq!(values[[0, 0]], 0.0);
        assert_eq!(values[[0, values.ncols() - 1]], 1.0);
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
