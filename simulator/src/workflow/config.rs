use anyhow::{ensure, Context};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trackdens::processing::{DensityOptions, MaskParams};
use trackdens::{DensityType, LonLatGrid, RunConfig, DENSITY_TYPES};

/// Regular lon/lat grid given by its outer centres and spacing in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub step: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            lon_min: -20.0,
            lon_max: 50.0,
            lat_min: 60.0,
            lat_max: 85.0,
            step: 1.0,
        }
    }
}

impl GridSpec {
    pub fn lon_axis(&self) -> Array1<f64> {
        Array1::range(self.lon_min, self.lon_max + self.step / 2.0, self.step)
    }

    pub fn lat_axis(&self) -> Array1<f64> {
        Array1::range(self.lat_min, self.lat_max + self.step / 2.0, self.step)
    }

    pub fn to_grid(&self) -> anyhow::Result<LonLatGrid> {
        ensure!(self.step > 0.0, "grid step must be positive, got {}", self.step);
        LonLatGrid::from_axes(self.lon_axis().view(), self.lat_axis().view())
            .context("building density grid")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub grid: GridSpec,
    pub domain: RunConfig,
    pub density_types: Vec<DensityType>,
    pub density: DensityOptions,
    /// Minimum distance from the domain edges for the `bound` category.
    pub boundary_dist_km: Option<f64>,
    /// Thresholds for the `land` category.
    pub mask: Option<MaskParams>,
    pub start_year: i32,
    pub n_winters: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let grid = GridSpec::default();
        let domain = RunConfig {
            lon1: Some(grid.lon_min),
            lon2: Some(grid.lon_max),
            lat1: Some(grid.lat_min),
            lat2: Some(grid.lat_max),
        };
        Self {
            grid,
            domain,
            density_types: DENSITY_TYPES.to_vec(),
            density: DensityOptions::default(),
            boundary_dist_km: Some(200.0),
            mask: Some(MaskParams::default()),
            start_year: 2000,
            n_winters: 3,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(start_year: i32, n_winters: usize) -> Self {
        Self {
            start_year,
            n_winters,
            ..Default::default()
        }
    }
}
