//! New car input

use super::validation::{at_least, required_name, within};
use super::ValidationError;
use crate::simulation::CarStats;

/// Maximum length for car names
pub const MAX_CAR_NAME_LEN: usize = 128;

/// Slowest base speed the form accepts (km/h)
pub const MIN_BASE_SPEED_KMH: f64 = 120.0;

pub const DEFAULT_BASE_SPEED_KMH: f64 = 220.0;
pub const DEFAULT_DURABILITY: f64 = 0.85;
pub const DEFAULT_ACCELERATION: f64 = 0.90;

/// Validated car ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    name: String,
    team_id: i64,
    stats: CarStats,
}

impl NewCar {
    /// Validate raw form input.
    ///
    /// Speed must be at least 120 km/h; durability and acceleration lie in `[0, 1]`.
    pub fn new(
        name: &str,
        team_id: i64,
        speed_kmh: f64,
        durability: f64,
        acceleration: f64,
    ) -> Result<Self, ValidationError> {
        let name = required_name("Car name", name, MAX_CAR_NAME_LEN)?;
        let stats = CarStats {
            speed_kmh: at_least("Base speed", speed_kmh, MIN_BASE_SPEED_KMH)?,
            durability: within("Durability", durability, 0.0, 1.0)?,
            acceleration: within("Acceleration", acceleration, 0.0, 1.0)?,
        };
        Ok(Self {
            name,
            team_id,
            stats,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team_id(&self) -> i64 {
        self.team_id
    }

    pub fn stats(&self) -> CarStats {
        self.stats
    }
}
