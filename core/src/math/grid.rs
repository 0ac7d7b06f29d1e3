use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Axis, Ix2};
use serde::{Deserialize, Serialize};

use crate::prelude::{DensityError, DensityResult};

/// Pair of 2D longitude/latitude arrays describing grid-cell centres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LonLatGrid {
    lon2d: Array2<f64>,
    lat2d: Array2<f64>,
}

impl LonLatGrid {
    pub fn new(lon2d: Array2<f64>, lat2d: Array2<f64>) -> DensityResult<Self> {
        if lon2d.dim() != lat2d.dim() {
            return Err(DensityError::Grid(format!(
                "longitude grid {:?} and latitude grid {:?} differ in shape",
                lon2d.dim(),
                lat2d.dim()
            )));
        }
        if lon2d.is_empty() {
            return Err(DensityError::Grid("grid has no cells".into()));
        }
        Ok(Self { lon2d, lat2d })
    }

    /// Rectilinear grid from 1D coordinate axes.
    pub fn from_axes(lon: ArrayView1<f64>, lat: ArrayView1<f64>) -> DensityResult<Self> {
        let (lon2d, lat2d) = meshgrid(lon, lat);
        Self::new(lon2d, lat2d)
    }

    pub fn lon2d(&self) -> ArrayView2<'_, f64> {
        self.lon2d.view()
    }

    pub fn lat2d(&self) -> ArrayView2<'_, f64> {
        self.lat2d.view()
    }

    /// `(n_lat, n_lon)`.
    pub fn dim(&self) -> (usize, usize) {
        self.lon2d.dim()
    }

    pub fn lon_axis(&self) -> ArrayView1<'_, f64> {
        self.lon2d.index_axis(Axis(0), 0)
    }

    pub fn lat_axis(&self) -> ArrayView1<'_, f64> {
        self.lat2d.index_axis(Axis(1), 0)
    }

    /// True when every row shares the longitudes and every column the latitudes.
    pub fn is_rectilinear(&self) -> bool {
        let lon = self.lon_axis();
        let lat = self.lat_axis();
        self.lon2d.rows().into_iter().all(|row| row == lon)
            && self.lat2d.columns().into_iter().all(|col| col == lat)
    }
}

/// Fractional land cover on a lon/lat grid, stored as `(latitude, longitude)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LandSeaMaskRecord")]
pub struct LandSeaMask {
    longitude: Array1<f64>,
    latitude: Array1<f64>,
    values: Array2<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LandSeaMaskRecord {
    longitude: Array1<f64>,
    latitude: Array1<f64>,
    values: ArrayD<f64>,
}

impl TryFrom<LandSeaMaskRecord> for LandSeaMask {
    type Error = DensityError;

    fn try_from(record: LandSeaMaskRecord) -> Result<Self, Self::Error> {
        LandSeaMask::from_dyn(record.longitude, record.latitude, record.values)
    }
}

impl LandSeaMask {
    pub fn new(
        longitude: Array1<f64>,
        latitude: Array1<f64>,
        values: Array2<f64>,
    ) -> DensityResult<Self> {
        let expected = (latitude.len(), longitude.len());
        if values.dim() != expected {
            return Err(DensityError::InvalidMask(format!(
                "values have shape {:?}, coordinates imply {:?}",
                values.dim(),
                expected
            )));
        }
        Ok(Self {
            longitude,
            latitude,
            values,
        })
    }

    /// Accepts an array of any rank and requires it to be two-dimensional.
    pub fn from_dyn(
        longitude: Array1<f64>,
        latitude: Array1<f64>,
        values: ArrayD<f64>,
    ) -> DensityResult<Self> {
        let ndim = values.ndim();
        let values = values.into_dimensionality::<Ix2>().map_err(|_| {
            DensityError::InvalidMask(format!("expected a 2D array, got {} dimensions", ndim))
        })?;
        Self::new(longitude, latitude, values)
    }

    pub fn longitude(&self) -> ArrayView1<'_, f64> {
        self.longitude.view()
    }

    pub fn latitude(&self) -> ArrayView1<'_, f64> {
        self.latitude.view()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn grid(&self) -> DensityResult<LonLatGrid> {
        LonLatGrid::from_axes(self.longitude.view(), self.latitude.view())
    }
}

/// Expands 1D axes into `(n_lat, n_lon)` coordinate arrays.
pub fn meshgrid(lon: ArrayView1<f64>, lat: ArrayView1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (lat.len(), lon.len());
    let lon2d = Array2::from_shape_fn(shape, |(_, j)| lon[j]);
    let lat2d = Array2::from_shape_fn(shape, |(i, _)| lat[i]);
    (lon2d, lat2d)
}

/// Cell boundaries around monotonic centres: midpoints inside, half a step
/// beyond the first and last centre.
pub(crate) fn cell_edges(centres: ArrayView1<f64>) -> DensityResult<Vec<f64>> {
    let n = centres.len();
    if n < 2 {
        return Err(DensityError::Grid(
            "cell binning needs at least two centres per axis".into(),
        ));
    }
    let ascending = centres[1] > centres[0];
    let monotonic = centres
        .iter()
        .zip(centres.iter().skip(1))
        .all(|(&a, &b)| if ascending { b > a } else { b < a });
    if !monotonic {
        return Err(DensityError::Grid("axis is not strictly monotonic".into()));
    }

    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
    for k in 1..n {
        edges.push((centres[k - 1] + centres[k]) / 2.0);
    }
    edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
    Ok(edges)
}

/// Index of the cell containing `value`, for ascending or descending edges.
/// A value on an inner edge belongs to the later cell in axis order; both
/// outer edges are inclusive.
pub(crate) fn locate(edges: &[f64], value: f64) -> Option<usize> {
    let n = edges.len();
    if n < 2 || !value.is_finite() {
        return None;
    }
    let ascending = edges[n - 1] > edges[0];
    let (lo, hi) = if ascending {
        (edges[0], edges[n - 1])
    } else {
        (edges[n - 1], edges[0])
    };
    if value < lo || value > hi {
        return None;
    }
    let above = if ascending {
        edges.partition_point(|&e| e <= value)
    } else {
        edges.partition_point(|&e| e >= value)
    };
    Some(above.saturating_sub(1).min(n - 2))
}
