use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::grid::LonLatGrid;
use crate::prelude::{DensityError, DensityResult, DensityType, TrackFilter};
use crate::processing::density::{compute_density, DensityOptions};
use crate::processing::filters::LonLatBox;
use crate::telemetry::log::LogManager;
use crate::track::cyclone::Track;

/// Domain bounds of a track run. Unset bounds leave that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub lon1: Option<f64>,
    pub lon2: Option<f64>,
    pub lat1: Option<f64>,
    pub lat2: Option<f64>,
}

impl RunConfig {
    pub fn from_box(bbox: &LonLatBox) -> Self {
        Self {
            lon1: Some(bbox.lon_min),
            lon2: Some(bbox.lon_max),
            lat1: Some(bbox.lat_min),
            lat2: Some(bbox.lat_max),
        }
    }

    /// Full rectangle, available only when all four bounds are set.
    pub fn extent(&self) -> Option<LonLatBox> {
        match (self.lon1, self.lon2, self.lat1, self.lat2) {
            (Some(lon_min), Some(lon_max), Some(lat_min), Some(lat_max)) => Some(LonLatBox {
                lon_min,
                lon_max,
                lat_min,
                lat_max,
            }),
            _ => None,
        }
    }

    /// Whether `(lon, lat)` satisfies every configured bound.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.lon1.map_or(true, |b| lon >= b)
            && self.lon2.map_or(true, |b| lon <= b)
            && self.lat1.map_or(true, |b| lat >= b)
            && self.lat2.map_or(true, |b| lat <= b)
    }
}

#[derive(Debug, Clone)]
struct Category {
    label: String,
    members: Vec<usize>,
}

/// Labelled group of filters applied by [`TrackRun::classify`].
pub type Condition<'a> = (&'a str, Vec<&'a dyn TrackFilter>);

/// Collection of tracks with optional categorisation into named subsets.
#[derive(Debug, Clone)]
pub struct TrackRun {
    tracks: Vec<Track>,
    pub conf: RunConfig,
    categories: Vec<Category>,
    logger: LogManager,
}

impl TrackRun {
    pub fn new(tracks: Vec<Track>, conf: RunConfig) -> Self {
        Self {
            tracks,
            conf,
            categories: Vec::new(),
            logger: LogManager::new("trackrun"),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Iterates over the tracks one at a time.
    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_categorised(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Category labels in insertion order.
    pub fn cat_labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn category_size(&self, label: &str) -> Option<usize> {
        self.find_category(label).map(|c| c.members.len())
    }

    /// Tracks of the named category, or every track when `label` is `None`.
    pub fn subset(&self, label: Option<&str>) -> DensityResult<Vec<&Track>> {
        match label {
            None => Ok(self.tracks.iter().collect()),
            Some(name) => {
                let category = self.find_category(name).ok_or_else(|| {
                    DensityError::Argument(format!("unknown subset `{}`", name))
                })?;
                Ok(category.members.iter().map(|&i| &self.tracks[i]).collect())
            }
        }
    }

    /// Stores the tracks that pass every filter under `label`, replacing any
    /// earlier category of the same name. Returns the category size.
    pub fn categorise(&mut self, label: &str, filters: &[&dyn TrackFilter]) -> DensityResult<usize> {
        let members = self.select(0..self.tracks.len(), filters)?;
        Ok(self.store_category(label, members))
    }

    /// Applies each condition in order. With `inclusive`, every category is
    /// drawn from the members of the previous one.
    pub fn classify(&mut self, conditions: &[Condition<'_>], inclusive: bool) -> DensityResult<()> {
        let mut candidates: Vec<usize> = (0..self.tracks.len()).collect();
        for (label, filters) in conditions {
            let members = self.select(candidates.iter().copied(), filters)?;
            if inclusive {
                candidates = members.clone();
            }
            self.store_category(label, members);
        }
        Ok(())
    }

    pub fn clear_categories(&mut self) {
        self.categories.clear();
    }

    /// Density of one event type for one subset on the given grid.
    pub fn density(
        &self,
        grid: &LonLatGrid,
        by: DensityType,
        subset: Option<&str>,
        opts: &DensityOptions,
    ) -> DensityResult<Array2<f64>> {
        let tracks = self.subset(subset)?;
        compute_density(&tracks, grid, by, opts)
    }

    fn find_category(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }

    fn select(
        &self,
        candidates: impl Iterator<Item = usize>,
        filters: &[&dyn TrackFilter],
    ) -> DensityResult<Vec<usize>> {
        let mut members = Vec::new();
        'tracks: for idx in candidates {
            let track = &self.tracks[idx];
            for filter in filters {
                if !filter.check(track, self)? {
                    continue 'tracks;
                }
            }
            members.push(idx);
        }
        Ok(members)
    }

    fn store_category(&mut self, label: &str, members: Vec<usize>) -> usize {
        let size = members.len();
        self.logger.record(&format!(
            "category `{}` holds {} of {} tracks",
            label,
            size,
            self.tracks.len()
        ));
        match self.categories.iter_mut().find(|c| c.label == label) {
            Some(existing) => existing.members = members,
            None => self.categories.push(Category {
                label: label.to_string(),
                members,
            }),
        }
        size
    }
}

impl<'a> IntoIterator for &'a TrackRun {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
