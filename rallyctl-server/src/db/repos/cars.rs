//! Car repository

use rallyctl_core::{CarStats, NewCar};
use serde::Serialize;

use crate::db::{DbError, Row, Session};

/// Car record joined with its team's name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Car {
    pub car_id: i64,
    pub car_name: String,
    /// `None` when the car was never assigned or its team was deleted
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub speed: f64,
    pub durability: f64,
    pub acceleration: f64,
}

impl Car {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            car_id: row.get("CAR_ID")?,
            car_name: row.get("CAR_NAME")?,
            team_id: row.get("TEAM_ID")?,
            team_name: row.get("TEAM_NAME")?,
            speed: row.get("SPEED")?,
            durability: row.get("DURABILITY")?,
            acceleration: row.get("ACCELERATION")?,
        })
    }

    pub fn stats(&self) -> CarStats {
        CarStats {
            speed_kmh: self.speed,
            durability: self.durability,
            acceleration: self.acceleration,
        }
    }
}

/// Car repository
pub struct CarRepo<'a> {
    session: &'a Session,
}

impl<'a> CarRepo<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Insert a car. Returns rows inserted.
    pub async fn add(&self, car: &NewCar) -> Result<u64, DbError> {
        let stats = car.stats();
        self.session
            .execute(
                r#"
                INSERT INTO CARS.CARS (CAR_NAME, TEAM_ID, SPEED, DURABILITY, ACCELERATION)
                VALUES (?, ?, ?, ?, ?)
                "#,
                &[
                    car.name().into(),
                    car.team_id().into(),
                    stats.speed_kmh.into(),
                    stats.durability.into(),
                    stats.acceleration.into(),
                ],
            )
            .await
    }

    /// All cars with their team name, ordered by id.
    ///
    /// LEFT JOIN keeps cars whose team no longer exists.
    pub async fn list(&self) -> Result<Vec<Car>, DbError> {
        let rows = self
            .session
            .fetch_all(
                r#"
                SELECT
                    c.CAR_ID,
                    c.CAR_NAME,
                    c.TEAM_ID,
                    t.TEAM_NAME,
                    c.SPEED,
                    c.DURABILITY,
                    c.ACCELERATION
                FROM CARS.CARS c
                LEFT JOIN TEAMS.TEAMS t
                    ON c.TEAM_ID = t.TEAM_ID
                ORDER BY c.CAR_ID
                "#,
                &[],
            )
            .await?;
        rows.iter().map(Car::from_row).collect()
    }

    /// Delete a car. Returns rows deleted.
    pub async fn delete(&self, car_id: i64) -> Result<u64, DbError> {
        self.session
            .execute("DELETE FROM CARS.CARS WHERE CAR_ID = ?", &[car_id.into()])
            .await
    }
}
