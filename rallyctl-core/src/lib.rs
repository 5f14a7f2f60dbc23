//! rallyctl-core: domain types for the rally dashboard
//!
//! Everything here is free of I/O against the warehouse:
//! - validated input models (teams, cars, race settings)
//! - the track catalog and the race time simulation
//! - configuration loading (environment + optional TOML file)

pub mod config;
pub mod error;
pub mod models;
pub mod simulation;
pub mod track;

pub use config::{RaceDefaults, RallyConfig, ServerSettings, SnowflakeConfig};
pub use error::{CoreError, Result};
pub use models::{parse_id, parse_number, NewCar, NewTeam, RaceSettings, ValidationError};
pub use simulation::{rank, simulate_time_minutes, CarStats, Entry, Standing};
pub use track::{Track, TrackCatalog};
