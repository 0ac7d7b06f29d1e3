use ndarray::ArrayView2;

use crate::math::geodesy::GeoHelper;

/// Fraction of track points lying closer than `rad` metres to at least one
/// masked cell (`mask == 1.0`).
///
/// `lonlat` holds one `[lon, lat]` row per point. An empty track, or a mask
/// with no marked cells, yields `0.0`.
pub fn mask_tracks(
    mask: ArrayView2<f64>,
    lon2d: ArrayView2<f64>,
    lat2d: ArrayView2<f64>,
    lonlat: ArrayView2<f64>,
    rad: f64,
) -> f64 {
    let n_points = lonlat.nrows();
    if n_points == 0 {
        return 0.0;
    }

    let masked: Vec<(f64, f64)> = mask
        .indexed_iter()
        .filter(|(_, v)| **v == 1.0)
        .map(|(idx, _)| (lon2d[idx], lat2d[idx]))
        .collect();

    let near = lonlat
        .rows()
        .into_iter()
        .filter(|row| {
            masked
                .iter()
                .any(|&(lon, lat)| GeoHelper::great_circle(row[0], lon, row[1], lat) < rad)
        })
        .count();

    near as f64 / n_points as f64
}
