use crate::workflow::runner::WorkflowResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceSummary {
    pub subset: String,
    pub dens_type: String,
    pub total: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub label: String,
    pub size: usize,
}

/// JSON summary of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DensityReport {
    pub n_tracks: usize,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub subsets: Vec<String>,
    pub dens_types: Vec<String>,
    pub slices: Vec<SliceSummary>,
    pub categories: Vec<CategorySummary>,
    pub monthly_counts: Vec<usize>,
    pub start_year: i32,
    pub winter_counts: Vec<usize>,
}

impl DensityReport {
    pub fn from_result(result: &WorkflowResult, start_year: i32) -> Self {
        let cube = &result.cube;
        let subsets: Vec<String> = cube
            .subsets
            .iter()
            .map(|s| s.clone().unwrap_or_else(|| "all".to_string()))
            .collect();
        let dens_types: Vec<String> = cube.dens_types.iter().map(|t| t.to_string()).collect();

        let mut slices = Vec::with_capacity(subsets.len() * dens_types.len());
        for (s_idx, subset) in subsets.iter().enumerate() {
            for (t_idx, dens_type) in dens_types.iter().enumerate() {
                let slice = cube.slice(s_idx, t_idx);
                slices.push(SliceSummary {
                    subset: subset.clone(),
                    dens_type: dens_type.clone(),
                    total: slice.sum(),
                    max: slice.iter().copied().fold(0.0, f64::max),
                });
            }
        }

        Self {
            n_tracks: result.n_tracks,
            dims: cube.dims().iter().map(|d| d.to_string()).collect(),
            shape: cube.shape().to_vec(),
            subsets,
            dens_types,
            slices,
            categories: result
                .categories
                .iter()
                .map(|(label, size)| CategorySummary {
                    label: label.clone(),
                    size: *size,
                })
                .collect(),
            monthly_counts: result.monthly_counts.to_vec(),
            start_year,
            winter_counts: result.winter_counts.to_vec(),
        }
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("serializing density report")?;
        fs::write(path_ref, text)
            .with_context(|| format!("writing density report {}", path_ref.display()))
    }
}
