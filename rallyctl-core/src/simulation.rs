//! Race time simulation and ranking
//!
//! Times are in minutes, lower is better. Randomness comes from the caller's
//! RNG so a seeded `StdRng` gives reproducible races.

use rand::Rng;
use serde::Serialize;

/// Slowest effective speed a car can drop to (km/h)
pub const MIN_EFFECTIVE_SPEED_KMH: f64 = 50.0;

/// Default race distance (km)
pub const DEFAULT_DISTANCE_KM: f64 = 100.0;

/// Default random speed variation band
pub const DEFAULT_VARIABILITY: (f64, f64) = (0.95, 1.05);

/// Performance-relevant car attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarStats {
    pub speed_kmh: f64,
    /// 0.0..=1.0, clamped when simulating
    pub durability: f64,
    /// 0.0..=1.0, clamped when simulating
    pub acceleration: f64,
}

/// Maps a 0..1 attribute onto a 0.5..1.0 speed multiplier.
fn performance(attr: f64) -> f64 {
    0.5 + 0.5 * attr.clamp(0.0, 1.0)
}

/// Simulate how long a car needs for `distance_km` on a track.
///
/// `variability` is the closed range the random factor is drawn from and must
/// satisfy `lo <= hi`. The result is rounded to three decimals.
pub fn simulate_time_minutes<R: Rng + ?Sized>(
    stats: CarStats,
    track_factor: f64,
    variability: (f64, f64),
    distance_km: f64,
    rng: &mut R,
) -> f64 {
    let (lo, hi) = variability;
    let jitter = rng.gen_range(lo..=hi);

    let effective = (stats.speed_kmh
        * performance(stats.durability)
        * performance(stats.acceleration)
        * jitter
        * track_factor)
        .max(MIN_EFFECTIVE_SPEED_KMH);

    let minutes = distance_km / effective * 60.0;
    (minutes * 1000.0).round() / 1000.0
}

/// One car's simulated run, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub car_id: i64,
    pub team_id: i64,
    pub time_minutes: f64,
}

/// A ranked run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub car_id: i64,
    pub team_id: i64,
    pub time_minutes: f64,
    /// 1-based finishing position
    pub position: i64,
}

/// Order entries by time (ties keep input order) and assign positions from 1.
pub fn rank(mut entries: Vec<Entry>) -> Vec<Standing> {
    entries.sort_by(|a, b| a.time_minutes.total_cmp(&b.time_minutes));
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, e)| Standing {
            car_id: e.car_id,
            team_id: e.team_id,
            time_minutes: e.time_minutes,
            position: idx as i64 + 1,
        })
        .collect()
}
