//! Race run settings

use super::validation::at_least;
use super::ValidationError;
use crate::track::{Track, TrackCatalog};

/// Validated settings for one race run
#[derive(Debug, Clone, PartialEq)]
pub struct RaceSettings {
    track: Track,
    fee: f64,
    prize: f64,
}

impl RaceSettings {
    /// Resolve the track against the catalog and check the money amounts.
    pub fn new(
        track_name: &str,
        fee: f64,
        prize: f64,
        catalog: &TrackCatalog,
    ) -> Result<Self, ValidationError> {
        let track = catalog
            .get(track_name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownChoice {
                field: "track",
                value: track_name.to_owned(),
            })?;

        Ok(Self {
            track,
            fee: at_least("Participation fee", fee, 0.0)?,
            prize: at_least("Winner prize", prize, 0.0)?,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Charged to every team that owns at least one car
    pub fn fee(&self) -> f64 {
        self.fee
    }

    /// Credited to the winning team
    pub fn prize(&self) -> f64 {
        self.prize
    }
}
