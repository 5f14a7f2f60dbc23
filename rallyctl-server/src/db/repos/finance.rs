//! Budget movements tied to races

use crate::db::{DbError, Session};

/// Fee and prize bookings
pub struct FinanceRepo<'a> {
    session: &'a Session,
}

impl<'a> FinanceRepo<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Charge `fee` to every team that owns at least one car. Returns teams charged.
    pub async fn pay_participation_fee(&self, fee: f64) -> Result<u64, DbError> {
        self.session
            .execute(
                r#"
                UPDATE TEAMS.TEAMS t
                SET t.BUDGET = t.BUDGET - ?
                WHERE t.TEAM_ID IN (
                    SELECT DISTINCT TEAM_ID
                    FROM CARS.CARS
                    WHERE TEAM_ID IS NOT NULL
                )
                "#,
                &[fee.into()],
            )
            .await
    }

    /// Credit the race prize to the winner. Returns teams credited.
    pub async fn credit_prize(&self, winner_team_id: i64, prize: f64) -> Result<u64, DbError> {
        self.session
            .execute(
                r#"
                UPDATE TEAMS.TEAMS
                SET BUDGET = BUDGET + ?
                WHERE TEAM_ID = ?
                "#,
                &[prize.into(), winner_team_id.into()],
            )
            .await
    }
}
