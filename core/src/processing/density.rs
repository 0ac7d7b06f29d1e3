use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::geodesy::{GeoHelper, KM2M};
use crate::math::grid::{cell_edges, locate, LonLatGrid};
use crate::prelude::{DensityError, DensityResult, DensityType};
use crate::processing::filters::{exclude_by_first_day, exclude_by_last_day};
use crate::telemetry::log::LogManager;
use crate::track::cyclone::Track;

/// Default search radius of the radius method, in km.
pub const DEFAULT_RADIUS_KM: f64 = 222.0;

/// How events are attributed to grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DensityMethod {
    /// Count events falling inside each cell of a rectilinear grid.
    Cell,
    /// Count events within `r_km` of each cell centre.
    Radius { r_km: f64 },
}

impl Default for DensityMethod {
    fn default() -> Self {
        DensityMethod::Radius {
            r_km: DEFAULT_RADIUS_KM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

/// Options shared by every per-type density call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityOptions {
    pub method: DensityMethod,
    /// Genesis events of tracks starting on this day are dropped.
    pub exclude_first: Option<MonthDay>,
    /// Lysis events of tracks ending on this day are dropped.
    pub exclude_last: Option<MonthDay>,
    /// Express counts per this many km² of counting area.
    pub per_area_km2: Option<f64>,
}

/// Density of one event type over `tracks`, shaped like `grid`.
pub fn compute_density(
    tracks: &[&Track],
    grid: &LonLatGrid,
    by: DensityType,
    opts: &DensityOptions,
) -> DensityResult<Array2<f64>> {
    let logger = LogManager::new("density");
    if let Some(per_area) = opts.per_area_km2 {
        if per_area.is_nan() || per_area <= 0.0 {
            return Err(DensityError::Argument(format!(
                "normalisation area must be positive, got {} km2",
                per_area
            )));
        }
    }
    let events = event_groups(tracks, by, opts);

    let (mut dens, area) = match opts.method {
        DensityMethod::Cell => {
            let (lon_edges, lat_edges) = rectilinear_edges(grid)?;
            let dens = cell_density(&events, grid, by, &lon_edges, &lat_edges);
            let area = opts
                .per_area_km2
                .map(|_| cell_areas(grid, &lon_edges, &lat_edges));
            (dens, area)
        }
        DensityMethod::Radius { r_km } => {
            if r_km.is_nan() || r_km <= 0.0 {
                return Err(DensityError::Argument(format!(
                    "search radius must be positive, got {} km",
                    r_km
                )));
            }
            let dens = radius_density(&events, grid, by, r_km * KM2M);
            let area = opts.per_area_km2.map(|_| {
                Array2::from_elem(grid.dim(), std::f64::consts::PI * r_km * r_km)
            });
            (dens, area)
        }
    };

    if let (Some(per_area), Some(area)) = (opts.per_area_km2, area) {
        dens.zip_mut_with(&area, |d, &a| *d = *d / a * per_area);
    }

    logger.detail(&format!(
        "{} density over {} tracks, total {:.3}",
        by,
        tracks.len(),
        dens.sum()
    ));
    Ok(dens)
}

/// Event positions grouped per track.
fn event_groups(tracks: &[&Track], by: DensityType, opts: &DensityOptions) -> Vec<Vec<(f64, f64)>> {
    tracks
        .iter()
        .filter_map(|track| match by {
            DensityType::Point | DensityType::Track => {
                Some(track.points().iter().map(|p| (p.lon, p.lat)).collect())
            }
            DensityType::Genesis => {
                let keep = opts
                    .exclude_first
                    .map_or(true, |md| exclude_by_first_day(track, md.month, md.day));
                keep.then(|| vec![(track.genesis().lon, track.genesis().lat)])
            }
            DensityType::Lysis => {
                let keep = opts
                    .exclude_last
                    .map_or(true, |md| exclude_by_last_day(track, md.month, md.day));
                keep.then(|| vec![(track.lysis().lon, track.lysis().lat)])
            }
        })
        .collect()
}

fn rectilinear_edges(grid: &LonLatGrid) -> DensityResult<(Vec<f64>, Vec<f64>)> {
    if !grid.is_rectilinear() {
        return Err(DensityError::Grid(
            "cell method requires a rectilinear grid".into(),
        ));
    }
    Ok((cell_edges(grid.lon_axis())?, cell_edges(grid.lat_axis())?))
}

fn cell_density(
    events: &[Vec<(f64, f64)>],
    grid: &LonLatGrid,
    by: DensityType,
    lon_edges: &[f64],
    lat_edges: &[f64],
) -> Array2<f64> {
    let mut dens = Array2::zeros(grid.dim());
    for group in events {
        let mut cells: Vec<(usize, usize)> = group
            .iter()
            .filter_map(|&(lon, lat)| Some((locate(lat_edges, lat)?, locate(lon_edges, lon)?)))
            .collect();
        if by == DensityType::Track {
            cells.sort_unstable();
            cells.dedup();
        }
        for cell in cells {
            dens[cell] += 1.0;
        }
    }
    dens
}

fn radius_density(
    events: &[Vec<(f64, f64)>],
    grid: &LonLatGrid,
    by: DensityType,
    r_m: f64,
) -> Array2<f64> {
    let lon2d = grid.lon2d();
    let lat2d = grid.lat2d();
    Array2::from_shape_fn(grid.dim(), |idx| {
        let (clon, clat) = (lon2d[idx], lat2d[idx]);
        events
            .iter()
            .map(|group| {
                let near = group
                    .iter()
                    .filter(|&&(lon, lat)| GeoHelper::great_circle(clon, lon, clat, lat) <= r_m)
                    .count();
                if by == DensityType::Track {
                    near.min(1)
                } else {
                    near
                }
            })
            .sum::<usize>() as f64
    })
}

fn cell_areas(grid: &LonLatGrid, lon_edges: &[f64], lat_edges: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn(grid.dim(), |(i, j)| {
        let lat_s = lat_edges[i].clamp(-90.0, 90.0);
        let lat_n = lat_edges[i + 1].clamp(-90.0, 90.0);
        GeoHelper::spherical_cell_area_km2(lon_edges[j], lon_edges[j + 1], lat_s, lat_n)
    })
}
