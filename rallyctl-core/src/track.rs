//! Track catalog
//!
//! A track scales every car's effective speed by its `factor`.

use serde::{Deserialize, Serialize};

/// A single race track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Multiplier applied to effective speed (1.0 = ideal surface)
    pub factor: f64,
    #[serde(default)]
    pub description: String,
}

impl Track {
    pub fn new(name: &str, factor: f64, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            factor,
            description: description.to_owned(),
        }
    }
}

/// Ordered list of tracks offered in the race form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackCatalog(Vec<Track>);

impl Default for TrackCatalog {
    fn default() -> Self {
        Self(vec![
            Track::new("Asphalt Sprint", 1.00, "Fast, clean asphalt"),
            Track::new("Desert Loop", 0.92, "Sand reduces grip"),
            Track::new("Forest Run", 0.96, "Mixed terrain, narrow"),
            Track::new("Mountain Pass", 0.90, "Steep climbs, tricky"),
        ])
    }
}

impl TrackCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self(tracks)
    }

    /// Look up a track by exact name.
    pub fn get(&self, name: &str) -> Option<&Track> {
        self.0.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
