use anyhow::{ensure, Context};
use chrono::{Duration, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trackdens::{Track, TrackPoint};

/// Length of the October-April genesis window.
const SEASON_HOURS: i64 = 212 * 24;

/// Configuration for generating synthetic cyclone tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub n_tracks: usize,
    pub seed: u64,
    /// Tracks are spread over the winters following this year.
    pub start_year: i32,
    pub n_winters: usize,
    pub lon_range: (f64, f64),
    pub lat_range: (f64, f64),
    pub min_points: usize,
    pub max_points: usize,
    pub step_hours: i64,
    /// Largest per-step displacement in degrees.
    pub max_step_deg: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_tracks: 200,
            seed: 0,
            start_year: 2000,
            n_winters: 3,
            lon_range: (-20.0, 50.0),
            lat_range: (60.0, 85.0),
            min_points: 4,
            max_points: 24,
            step_hours: 3,
            max_step_deg: 0.8,
        }
    }
}

/// Random-walk tracks seeded inside the configured box, each starting between
/// October and April of one of the winters.
pub fn synthesize_tracks(config: &GeneratorConfig) -> anyhow::Result<Vec<Track>> {
    ensure!(config.n_winters > 0, "at least one winter is required");
    ensure!(
        config.min_points > 0 && config.min_points <= config.max_points,
        "invalid point range {}..={}",
        config.min_points,
        config.max_points
    );
    ensure!(
        config.lon_range.0 < config.lon_range.1 && config.lat_range.0 < config.lat_range.1,
        "empty genesis box"
    );
    ensure!(config.max_step_deg > 0.0, "step size must be positive");
    ensure!(
        config.step_hours > 0 && config.step_hours <= SEASON_HOURS,
        "time step must be within 1..={} hours, got {}",
        SEASON_HOURS,
        config.step_hours
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut tracks = Vec::with_capacity(config.n_tracks);

    for id in 0..config.n_tracks {
        let winter = rng.gen_range(0..config.n_winters) as i32;
        let season_start = NaiveDate::from_ymd_opt(config.start_year + winter, 10, 1)
            .context("season start out of range")?
            .and_hms_opt(0, 0, 0)
            .context("invalid season start time")?;
        let offset_steps = rng.gen_range(0..(SEASON_HOURS / config.step_hours));
        let mut time = season_start + Duration::hours(offset_steps * config.step_hours);

        let mut lon = rng.gen_range(config.lon_range.0..config.lon_range.1);
        let mut lat = rng.gen_range(config.lat_range.0..config.lat_range.1);
        let n_points = rng.gen_range(config.min_points..=config.max_points);
        let drift = rng.gen_range(0.0..config.max_step_deg);

        let mut points = Vec::with_capacity(n_points);
        for _ in 0..n_points {
            points.push(TrackPoint::new(time, lon, lat));
            time += Duration::hours(config.step_hours);
            lon += drift + rng.gen_range(-config.max_step_deg..config.max_step_deg) / 2.0;
            lat = (lat + rng.gen_range(-config.max_step_deg..config.max_step_deg) / 2.0)
                .clamp(-89.0, 89.0);
        }

        tracks.push(Track::new(id, points).with_context(|| format!("building track {}", id))?);
    }

    Ok(tracks)
}
