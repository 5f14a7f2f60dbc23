//! Repository implementations for rally data
//!
//! Each repository borrows a `Session` (or a `Transaction`, through deref)
//! and maps one domain operation to one parameterized statement.

pub mod cars;
pub mod finance;
pub mod races;
pub mod teams;

pub use cars::{Car, CarRepo};
pub use finance::FinanceRepo;
pub use races::{Race, RaceRepo, RaceResult, ResultRow};
pub use teams::{Team, TeamRepo};
