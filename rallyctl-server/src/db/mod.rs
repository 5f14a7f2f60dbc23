//! Database layer - warehouse session and repositories
//!
//! # Design Principles
//!
//! - One session per process, borrowed by repositories (no global state)
//! - Server-side parameter binding only
//! - List operations use JOINs for display names (no N+1)
//! - Multi-step writes run inside a `Transaction`

pub mod error;
pub mod migrations;
pub mod protocol;
pub mod repos;
pub mod session;
pub mod value;

pub use error::DbError;
pub use repos::*;
pub use session::{Session, Transaction};
pub use value::{FromValue, Row, Value};
