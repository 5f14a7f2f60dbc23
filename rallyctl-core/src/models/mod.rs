//! Input models with validation at construction
//!
//! Form and CLI input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod car;
pub mod race;
pub mod team;
pub mod validation;

pub use car::NewCar;
pub use race::RaceSettings;
pub use team::NewTeam;
pub use validation::{parse_id, parse_number, ValidationError};
