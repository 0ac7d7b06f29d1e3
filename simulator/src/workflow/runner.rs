use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use ndarray::Array1;
use trackdens::processing::{BoundaryFilter, MaskFilter};
use trackdens::track::run::Condition;
use trackdens::{
    bin_count_tracks, calc_all_dens, CountBy, DensityCube, LandSeaMask, Track, TrackFilter,
    TrackRun,
};

pub struct WorkflowResult {
    pub cube: DensityCube,
    pub monthly_counts: Array1<usize>,
    pub winter_counts: Array1<usize>,
    pub categories: Vec<(String, usize)>,
    pub n_tracks: usize,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, tracks: Vec<Track>, lsm: &LandSeaMask) -> anyhow::Result<WorkflowResult> {
        let grid = self.config.grid.to_grid()?;
        let mut run = TrackRun::new(tracks, self.config.domain);

        let boundary = match self.config.boundary_dist_km {
            Some(dist_km) => Some(
                BoundaryFilter::from_run(&run, dist_km * 1e3)
                    .context("building boundary filter")?,
            ),
            None => None,
        };
        let mask = match self.config.mask {
            Some(params) => Some(
                MaskFilter::new(lsm.clone(), params).context("building land-mask filter")?,
            ),
            None => None,
        };

        let mut conditions: Vec<Condition<'_>> = Vec::new();
        if let Some(filter) = boundary.as_ref() {
            conditions.push(("bound", vec![filter as &dyn TrackFilter]));
        }
        if let Some(filter) = mask.as_ref() {
            conditions.push(("land", vec![filter as &dyn TrackFilter]));
        }
        run.classify(&conditions, true)
            .context("classifying tracks")?;

        let categories = run
            .cat_labels()
            .into_iter()
            .map(|label| (label.to_string(), run.category_size(label).unwrap_or(0)))
            .collect();

        let cube = calc_all_dens(
            &run,
            &grid,
            None,
            &self.config.density_types,
            &self.config.density,
        )
        .context("computing density cube")?;

        let monthly_counts = bin_count_tracks(
            &run,
            self.config.start_year,
            self.config.n_winters,
            CountBy::Month,
        );
        let winter_counts = bin_count_tracks(
            &run,
            self.config.start_year,
            self.config.n_winters,
            CountBy::Winter,
        );
        info!(
            "workflow finished: {} tracks, cube {:?}",
            run.len(),
            cube.shape()
        );

        Ok(WorkflowResult {
            cube,
            monthly_counts,
            winter_counts,
            categories,
            n_tracks: run.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::landmask::coastal_land_sea_mask;
    use crate::generator::tracks::{synthesize_tracks, GeneratorConfig};
    use crate::workflow::config::GridSpec;
    use trackdens::{DensityMethod, DensityOptions, DensityType};

    fn small_config() -> WorkflowConfig {
        let mut cfg = WorkflowConfig::from_args(2000, 3);
        cfg.grid = GridSpec {
            lon_min: 0.0,
            lon_max: 20.0,
            lat_min: 65.0,
            lat_max: 75.0,
            step: 2.0,
        };
        cfg.domain = trackdens::RunConfig {
            lon1: Some(0.0),
            lon2: Some(20.0),
            lat1: Some(65.0),
            lat2: Some(75.0),
        };
        cfg.density = DensityOptions {
            method: DensityMethod::Cell,
            ..Default::default()
        };
        cfg
    }

    fn inputs(cfg: &WorkflowConfig) -> (Vec<Track>, LandSeaMask) {
        let gen = GeneratorConfig {
            n_tracks: 30,
            seed: 7,
            start_year: cfg.start_year,
            n_winters: cfg.n_winters,
            lon_range: (2.0, 18.0),
            lat_range: (67.0, 73.0),
            ..Default::default()
        };
        let lsm =
            coastal_land_sea_mask(cfg.grid.lon_axis(), cfg.grid.lat_axis(), 15.0, 1.0).unwrap();
        (synthesize_tracks(&gen).unwrap(), lsm)
    }

    #[test]
    fn runner_executes_workflow() {
        let cfg = small_config();
        let (tracks, lsm) = inputs(&cfg);
        let result = Runner::new(cfg.clone()).execute(tracks, &lsm).unwrap();

        assert_eq!(result.n_tracks, 30);
        assert_eq!(result.cube.shape(), [2, 4, 6, 11]);
        let labels: Vec<_> = result.categories.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["bound", "land"]);
        assert!(result.categories[1].1 <= result.categories[0].1);
        assert_eq!(result.monthly_counts.len(), 12);
        assert_eq!(result.winter_counts.len(), cfg.n_winters);
        assert!(result.winter_counts.sum() <= 30);
    }

    #[test]
    fn runner_without_filters_uses_whole_run() {
        let mut cfg = small_config();
        cfg.boundary_dist_km = None;
        cfg.mask = None;
        cfg.density_types = vec![DensityType::Genesis];
        let (tracks, lsm) = inputs(&cfg);
        let result = Runner::new(cfg).execute(tracks, &lsm).unwrap();

        assert!(result.categories.is_empty());
        assert_eq!(result.cube.subsets, vec![None]);
        assert_eq!(result.cube.shape(), [1, 1, 6, 11]);
        assert_eq!(result.cube.data.sum(), 30.0);
    }
}
