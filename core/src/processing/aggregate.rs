use ndarray::{s, Array4, ArrayView2};
use serde::Serialize;

use crate::math::grid::LonLatGrid;
use crate::prelude::{DensityError, DensityResult, DensityType};
use crate::processing::density::DensityOptions;
use crate::telemetry::log::LogManager;
use crate::telemetry::progress::ProgressRecorder;
use crate::track::run::TrackRun;

/// Dimension names of a [`DensityCube`], outermost first.
pub const DENSITY_DIMS: [&str; 4] = ["subset", "dens_type", "latitude", "longitude"];

/// Labelled 4D density array indexed by (subset, dens_type, latitude, longitude).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCube {
    pub name: String,
    /// Subset coordinate; `None` stands for the whole, uncategorised run.
    pub subsets: Vec<Option<String>>,
    pub dens_types: Vec<DensityType>,
    pub grid: LonLatGrid,
    pub data: Array4<f64>,
}

impl DensityCube {
    pub fn dims(&self) -> [&'static str; 4] {
        DENSITY_DIMS
    }

    pub fn shape(&self) -> [usize; 4] {
        let (a, b, c, d) = self.data.dim();
        [a, b, c, d]
    }

    /// 2D slice by position along the subset and dens_type axes.
    pub fn slice(&self, subset_idx: usize, type_idx: usize) -> ArrayView2<'_, f64> {
        self.data.slice(s![subset_idx, type_idx, .., ..])
    }

    /// 2D slice by coordinate labels.
    pub fn get(&self, subset: Option<&str>, by: DensityType) -> Option<ArrayView2<'_, f64>> {
        let subset_idx = self.subsets.iter().position(|s| s.as_deref() == subset)?;
        let type_idx = self.dens_types.iter().position(|&t| t == by)?;
        Some(self.slice(subset_idx, type_idx))
    }
}

/// Computes every requested density type for every subset of `run` and stacks
/// the results as (subset, dens_type, latitude, longitude).
///
/// Without `subsets`, a categorised run contributes all of its categories and
/// an uncategorised run a single unnamed subset. Axis order follows the input
/// lists exactly.
pub fn calc_all_dens(
    run: &TrackRun,
    grid: &LonLatGrid,
    subsets: Option<&[&str]>,
    density_types: &[DensityType],
    opts: &DensityOptions,
) -> DensityResult<DensityCube> {
    let labels: Vec<Option<String>> = match subsets {
        None if run.is_categorised() => run
            .cat_labels()
            .into_iter()
            .map(|label| Some(label.to_string()))
            .collect(),
        None => vec![None],
        Some([]) => {
            return Err(DensityError::Argument(
                "`subsets` should be a non-empty sequence of labels".into(),
            ))
        }
        Some(list) => {
            if let Some(unknown) = list.iter().find(|l| run.category_size(l).is_none()) {
                return Err(DensityError::Argument(format!(
                    "`subsets` names unknown category `{}`",
                    unknown
                )));
            }
            list.iter().map(|label| Some(label.to_string())).collect()
        }
    };
    if density_types.is_empty() {
        return Err(DensityError::Argument(
            "at least one density type is required".into(),
        ));
    }

    let logger = LogManager::new("aggregate");
    let (n_lat, n_lon) = grid.dim();
    let mut data = Array4::zeros((labels.len(), density_types.len(), n_lat, n_lon));
    let mut progress = ProgressRecorder::new("subsets", labels.len());

    for (s_idx, label) in labels.iter().enumerate() {
        for (t_idx, &by) in density_types.iter().enumerate() {
            let dens = run.density(grid, by, label.as_deref(), opts)?;
            if dens.dim() != (n_lat, n_lon) {
                return Err(DensityError::Internal(format!(
                    "density of shape {:?} does not match grid {:?}",
                    dens.dim(),
                    (n_lat, n_lon)
                )));
            }
            data.slice_mut(s![s_idx, t_idx, .., ..]).assign(&dens);
        }
        progress.tick(label.as_deref().unwrap_or("<all>"));
    }
    progress.finish();

    logger.record(&format!(
        "density cube {:?} for {} subsets",
        data.dim(),
        labels.len()
    ));

    Ok(DensityCube {
        name: "density".to_string(),
        subsets: labels,
        dens_types: density_types.to_vec(),
        grid: grid.clone(),
        data,
    })
}
