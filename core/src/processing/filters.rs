use std::cell::RefCell;

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::math::geodesy::{GeoHelper, KM2M};
use crate::math::grid::{LandSeaMask, LonLatGrid};
use crate::math::mask::mask_tracks;
use crate::prelude::{DensityError, DensityResult, TrackFilter};
use crate::track::cyclone::Track;
use crate::track::run::{RunConfig, TrackRun};

/// Default minimum distance from the domain edges, in metres.
pub const DEFAULT_BOUNDARY_DIST_M: f64 = 200e3;

/// True unless the track starts on the given month and day.
pub fn exclude_by_first_day(track: &Track, month: u32, day: u32) -> bool {
    !track.starts_on(month, day)
}

/// True unless the track ends on the given month and day.
pub fn exclude_by_last_day(track: &Track, month: u32, day: u32) -> bool {
    !track.ends_on(month, day)
}

/// Longitude-latitude rectangle. Field order matches `[lon_min, lon_max, lat_min, lat_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLatBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAxis {
    Lon,
    Lat,
}

/// One side of a [`LonLatBox`]: the coordinate it fixes and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxEdge {
    pub axis: EdgeAxis,
    pub value: f64,
}

impl BoxEdge {
    /// Great-circle distance from `(lon, lat)` to its projection on this edge.
    pub fn distance_from(&self, lon: f64, lat: f64) -> f64 {
        match self.axis {
            EdgeAxis::Lon => GeoHelper::great_circle(self.value, lon, lat, lat),
            EdgeAxis::Lat => GeoHelper::great_circle(lon, lon, self.value, lat),
        }
    }
}

impl LonLatBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> DensityResult<Self> {
        if !(lon_min <= lon_max && lat_min <= lat_max) {
            return Err(DensityError::Argument(format!(
                "invalid box [{}, {}, {}, {}]",
                lon_min, lon_max, lat_min, lat_max
            )));
        }
        Ok(Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        })
    }

    pub fn from_slice(values: &[f64]) -> DensityResult<Self> {
        match *values {
            [lon_min, lon_max, lat_min, lat_max] => Self::new(lon_min, lon_max, lat_min, lat_max),
            _ => Err(DensityError::Argument(format!(
                "box needs 4 values, got {}",
                values.len()
            ))),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    /// Edges in box order: west, east, south, north.
    pub fn edges(&self) -> [BoxEdge; 4] {
        [
            BoxEdge {
                axis: EdgeAxis::Lon,
                value: self.lon_min,
            },
            BoxEdge {
                axis: EdgeAxis::Lon,
                value: self.lon_max,
            },
            BoxEdge {
                axis: EdgeAxis::Lat,
                value: self.lat_min,
            },
            BoxEdge {
                axis: EdgeAxis::Lat,
                value: self.lat_max,
            },
        ]
    }
}

/// True iff every point lies inside `bbox` and farther than `dist` metres
/// from each of its edges.
pub fn check_far_from_boundaries(track: &Track, bbox: &LonLatBox, dist: f64) -> bool {
    let points = track.points();
    if !points.iter().all(|p| bbox.contains(p.lon, p.lat)) {
        return false;
    }

    let mut result = true;
    for edge in bbox.edges() {
        result &= points.iter().all(|p| edge.distance_from(p.lon, p.lat) > dist);
    }
    result
}

/// Categorisation filter wrapping [`check_far_from_boundaries`].
#[derive(Debug, Clone, Copy)]
pub struct BoundaryFilter {
    pub bbox: LonLatBox,
    pub dist_m: f64,
}

impl BoundaryFilter {
    pub fn new(bbox: LonLatBox, dist_m: f64) -> Self {
        Self { bbox, dist_m }
    }

    /// Uses the full extent configured on the run.
    pub fn from_run(run: &TrackRun, dist_m: f64) -> DensityResult<Self> {
        let bbox = run.conf.extent().ok_or_else(|| {
            DensityError::Argument("track run has no complete lon/lat extent".into())
        })?;
        Ok(Self::new(bbox, dist_m))
    }
}

impl TrackFilter for BoundaryFilter {
    fn check(&self, track: &Track, _run: &TrackRun) -> DensityResult<bool> {
        Ok(check_far_from_boundaries(track, &self.bbox, self.dist_m))
    }
}

/// Thresholds of the land-mask proximity check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// Land fraction at or above which a cell counts as land.
    pub lmask_thresh: f64,
    /// Search radius around each track point, in km.
    pub rad_km: f64,
    /// Largest allowed share of the track lifetime near masked cells (0-1).
    pub mask_thresh: f64,
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            lmask_thresh: 1.0,
            rad_km: 50.0,
            mask_thresh: 0.5,
        }
    }
}

/// Outcome of [`check_by_mask`], including the boundary mask it built.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskCheck {
    pub passed: bool,
    pub near_fraction: f64,
    pub mask: Array2<f64>,
}

/// 1.0 where a cell lies outside the run bounds or is land at `lmask_thresh`,
/// 0.0 elsewhere.
pub fn boundary_mask(
    lsm: &LandSeaMask,
    conf: &RunConfig,
    lmask_thresh: f64,
) -> DensityResult<Array2<f64>> {
    let grid = lsm.grid()?;
    Ok(build_mask(&grid, lsm.values(), conf, lmask_thresh))
}

/// Checks whether `track` spends less than `mask_thresh` of its points within
/// `rad_km` of land or of the run's domain bounds.
pub fn check_by_mask(
    track: &Track,
    run: &TrackRun,
    lsm: &LandSeaMask,
    params: &MaskParams,
) -> DensityResult<MaskCheck> {
    let grid = lsm.grid()?;
    let mask = build_mask(&grid, lsm.values(), &run.conf, params.lmask_thresh);
    let near_fraction = near_fraction(track, &grid, mask.view(), params.rad_km);
    Ok(MaskCheck {
        passed: near_fraction < params.mask_thresh,
        near_fraction,
        mask,
    })
}

struct CachedMask {
    key: RunConfig,
    mask: Array2<f64>,
}

/// Reusable land-mask filter. The boundary mask is cached per set of run
/// bounds; the cache is not shared across threads.
pub struct MaskFilter {
    lsm: LandSeaMask,
    grid: LonLatGrid,
    params: MaskParams,
    cache: RefCell<Option<CachedMask>>,
}

impl MaskFilter {
    pub fn new(lsm: LandSeaMask, params: MaskParams) -> DensityResult<Self> {
        let grid = lsm.grid()?;
        Ok(Self {
            lsm,
            grid,
            params,
            cache: RefCell::new(None),
        })
    }

    pub fn params(&self) -> &MaskParams {
        &self.params
    }

    /// Mask built for the most recent run bounds, if any.
    pub fn cached_mask(&self) -> Option<Array2<f64>> {
        self.cache.borrow().as_ref().map(|c| c.mask.clone())
    }

    pub fn near_fraction(&self, track: &Track, run: &TrackRun) -> DensityResult<f64> {
        let mut cache = self.cache.borrow_mut();
        if cache.as_ref().map_or(true, |c| c.key != run.conf) {
            *cache = Some(CachedMask {
                key: run.conf,
                mask: build_mask(
                    &self.grid,
                    self.lsm.values(),
                    &run.conf,
                    self.params.lmask_thresh,
                ),
            });
        }
        let cached = cache
            .as_ref()
            .ok_or_else(|| DensityError::Internal("mask cache empty after refresh".into()))?;
        Ok(near_fraction(
            track,
            &self.grid,
            cached.mask.view(),
            self.params.rad_km,
        ))
    }
}

impl TrackFilter for MaskFilter {
    fn check(&self, track: &Track, run: &TrackRun) -> DensityResult<bool> {
        Ok(self.near_fraction(track, run)? < self.params.mask_thresh)
    }
}

fn build_mask(
    grid: &LonLatGrid,
    land: ArrayView2<f64>,
    conf: &RunConfig,
    lmask_thresh: f64,
) -> Array2<f64> {
    Zip::from(grid.lon2d())
        .and(grid.lat2d())
        .and(land)
        .map_collect(|&lon, &lat, &frac| {
            if !conf.contains(lon, lat) || frac >= lmask_thresh {
                1.0
            } else {
                0.0
            }
        })
}

fn near_fraction(track: &Track, grid: &LonLatGrid, mask: ArrayView2<f64>, rad_km: f64) -> f64 {
    let lonlat = track.lonlat_c();
    mask_tracks(
        mask,
        grid.lon2d(),
        grid.lat2d(),
        lonlat.view(),
        rad_km * KM2M,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::point::TrackPoint;
    use chrono::{Duration, NaiveDate};
    use ndarray::Array1;

    fn track(coords: &[(f64, f64)]) -> Track {
        let t0 = NaiveDate::from_ymd_opt(2001, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let points = coords
            .iter()
            .enumerate()
            .map(|(k, &(lon, lat))| TrackPoint::new(t0 + Duration::hours(3 * k as i64), lon, lat))
            .collect();
        Track::new(0, points).unwrap()
    }

    fn run_with(conf: RunConfig) -> TrackRun {
        TrackRun::new(Vec::new(), conf)
    }

    /// 0..=10 E, 60..=70 N at 1 degree, land east of 9 E.
    fn coastal_mask() -> LandSeaMask {
        let lon = Array1::range(0.0, 11.0, 1.0);
        let lat = Array1::range(60.0, 71.0, 1.0);
        let values = Array2::from_shape_fn((lat.len(), lon.len()), |(_, j)| {
            if j >= 9 {
                1.0
            } else {
                0.0
            }
        });
        LandSeaMask::new(lon, lat, values).unwrap()
    }

    #[test]
    fn box_requires_four_ordered_values() {
        assert!(LonLatBox::from_slice(&[-10.0, 20.0, 60.0]).is_err());
        assert!(LonLatBox::from_slice(&[20.0, -10.0, 60.0, 80.0]).is_err());
        let bbox = LonLatBox::from_slice(&[-10.0, 20.0, 60.0, 80.0]).unwrap();
        assert_eq!(bbox.edges()[3].axis, EdgeAxis::Lat);
        assert_eq!(bbox.edges()[3].value, 80.0);
    }

    #[test]
    fn track_deep_inside_box_is_far_from_boundaries() {
        let bbox = LonLatBox::from_slice(&[-10.0, 20.0, 60.0, 80.0]).unwrap();
        let inner = track(&[(5.0, 70.0), (6.0, 70.5), (7.0, 71.0)]);
        assert!(check_far_from_boundaries(&inner, &bbox, 200e3));
    }

    #[test]
    fn point_on_edge_fails_boundary_check() {
        let bbox = LonLatBox::from_slice(&[-10.0, 20.0, 60.0, 80.0]).unwrap();
        let on_edge = track(&[(5.0, 70.0), (5.0, 60.0)]);
        assert!(!check_far_from_boundaries(&on_edge, &bbox, 200e3));
    }

    #[test]
    fn point_close_to_edge_or_outside_fails() {
        let bbox = LonLatBox::from_slice(&[-10.0, 20.0, 60.0, 80.0]).unwrap();
        let near_east = track(&[(5.0, 70.0), (19.0, 70.0)]);
        assert!(!check_far_from_boundaries(&near_east, &bbox, 200e3));
        let outside = track(&[(5.0, 70.0), (25.0, 70.0)]);
        assert!(!check_far_from_boundaries(&outside, &bbox, 0.0));
    }

    #[test]
    fn boundary_filter_reads_run_extent() {
        let open = run_with(RunConfig::default());
        assert!(BoundaryFilter::from_run(&open, 1e3).is_err());

        let bbox = LonLatBox::from_slice(&[-10.0, 20.0, 60.0, 80.0]).unwrap();
        let run = run_with(RunConfig::from_box(&bbox));
        let filter = BoundaryFilter::from_run(&run, 200e3).unwrap();
        assert!(filter.check(&track(&[(5.0, 70.0)]), &run).unwrap());
    }

    #[test]
    fn open_water_track_passes_mask_check() {
        let run = run_with(RunConfig::default());
        let ot = track(&[(2.0, 65.0), (3.0, 65.5), (3.5, 66.0)]);
        let result = check_by_mask(&ot, &run, &coastal_mask(), &MaskParams::default()).unwrap();
        assert!(result.passed);
        assert_eq!(result.near_fraction, 0.0);
    }

    #[test]
    fn coastal_track_fails_mask_check() {
        let run = run_with(RunConfig::default());
        let ot = track(&[(3.0, 65.0), (9.0, 65.0), (9.1, 65.2), (9.2, 65.4)]);
        let result = check_by_mask(&ot, &run, &coastal_mask(), &MaskParams::default()).unwrap();
        assert!(!result.passed);
        assert_eq!(result.near_fraction, 0.75);
    }

    #[test]
    fn run_bounds_extend_the_mask() {
        let conf = RunConfig {
            lon1: Some(1.0),
            ..Default::default()
        };
        let run = run_with(conf);
        let mask = boundary_mask(&coastal_mask(), &run.conf, 1.0).unwrap();
        assert_eq!(mask[[0, 0]], 1.0);
        assert_eq!(mask[[0, 1]], 0.0);
        assert_eq!(mask[[5, 9]], 1.0);

        let ot = track(&[(0.1, 65.0), (0.2, 65.1)]);
        let result = check_by_mask(&ot, &run, &coastal_mask(), &MaskParams::default()).unwrap();
        assert!(!result.passed);
        assert_eq!(result.mask, mask);
    }

    #[test]
    fn land_threshold_controls_partial_cells() {
        let lon = Array1::range(0.0, 3.0, 1.0);
        let lat = Array1::range(60.0, 62.0, 1.0);
        let values = Array2::from_elem((2, 3), 0.4);
        let lsm = LandSeaMask::new(lon, lat, values).unwrap();
        let strict = boundary_mask(&lsm, &RunConfig::default(), 0.5).unwrap();
        assert_eq!(strict.sum(), 0.0);
        let loose = boundary_mask(&lsm, &RunConfig::default(), 0.3).unwrap();
        assert_eq!(loose.sum(), 6.0);
    }

    #[test]
    fn mask_filter_cache_follows_run_bounds() {
        let filter = MaskFilter::new(coastal_mask(), MaskParams::default()).unwrap();
        assert!(filter.cached_mask().is_none());

        let ot = track(&[(0.1, 65.0), (0.2, 65.1)]);
        let open = run_with(RunConfig::default());
        assert!(filter.check(&ot, &open).unwrap());
        assert!(filter.check(&ot, &open).unwrap());
        assert_eq!(filter.cached_mask().unwrap()[[0, 0]], 0.0);

        let bounded = run_with(RunConfig {
            lon1: Some(1.0),
            ..Default::default()
        });
        assert!(!filter.check(&ot, &bounded).unwrap());
        assert_eq!(filter.cached_mask().unwrap()[[0, 0]], 1.0);
    }

    #[test]
    fn mask_check_is_repeatable() {
        let run = run_with(RunConfig::default());
        let ot = track(&[(8.5, 62.0), (8.0, 63.0), (5.0, 64.0)]);
        let first = check_by_mask(&ot, &run, &coastal_mask(), &MaskParams::default()).unwrap();
        let second = check_by_mask(&ot, &run, &coastal_mask(), &MaskParams::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn day_exclusions_match_first_and_last_points() {
        let ot = track(&[(0.0, 60.0), (1.0, 60.0)]);
        assert!(!exclude_by_first_day(&ot, 2, 1));
        assert!(exclude_by_first_day(&ot, 2, 2));
        assert!(!exclude_by_last_day(&ot, 2, 1));
    }
}
