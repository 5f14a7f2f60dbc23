//! Team repository
//!
//! Teams own a budget that races debit (participation fee) and credit (prize).

use rallyctl_core::NewTeam;
use serde::Serialize;

use crate::db::{DbError, Row, Session};

/// Team record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub team_id: i64,
    pub team_name: String,
    pub members: Option<String>,
    pub budget: f64,
}

impl Team {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            team_id: row.get("TEAM_ID")?,
            team_name: row.get("TEAM_NAME")?,
            members: row.get("MEMBERS")?,
            budget: row.get::<Option<f64>>("BUDGET")?.unwrap_or(0.0),
        })
    }
}

/// Team repository
pub struct TeamRepo<'a> {
    session: &'a Session,
}

impl<'a> TeamRepo<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Insert a team. Returns rows inserted.
    pub async fn add(&self, team: &NewTeam) -> Result<u64, DbError> {
        self.session
            .execute(
                r#"
                INSERT INTO TEAMS.TEAMS (TEAM_NAME, MEMBERS, BUDGET)
                VALUES (?, ?, ?)
                "#,
                &[team.name().into(), team.members().into(), team.budget().into()],
            )
            .await
    }

    /// All teams ordered by id.
    pub async fn list(&self) -> Result<Vec<Team>, DbError> {
        let rows = self
            .session
            .fetch_all(
                r#"
                SELECT TEAM_ID, TEAM_NAME, MEMBERS, BUDGET
                FROM TEAMS.TEAMS
                ORDER BY TEAM_ID
                "#,
                &[],
            )
            .await?;
        rows.iter().map(Team::from_row).collect()
    }

    /// Find a team by exact name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DbError> {
        let row = self
            .session
            .fetch_one(
                r#"
                SELECT TEAM_ID, TEAM_NAME, MEMBERS, BUDGET
                FROM TEAMS.TEAMS
                WHERE TEAM_NAME = ?
                "#,
                &[name.into()],
            )
            .await?;
        row.as_ref().map(Team::from_row).transpose()
    }

    /// Add `delta` (may be negative) to a team's budget. Returns teams updated.
    pub async fn update_budget_delta(&self, team_id: i64, delta: f64) -> Result<u64, DbError> {
        self.session
            .execute(
                r#"
                UPDATE TEAMS.TEAMS
                SET BUDGET = BUDGET + ?
                WHERE TEAM_ID = ?
                "#,
                &[delta.into(), team_id.into()],
            )
            .await
    }

    /// Current budget, or `None` when the team does not exist.
    pub async fn budget(&self, team_id: i64) -> Result<Option<f64>, DbError> {
        let value = self
            .session
            .fetch_one_value(
                "SELECT BUDGET FROM TEAMS.TEAMS WHERE TEAM_ID = ?",
                &[team_id.into()],
            )
            .await?;

        value.map(|v| v.extract("BUDGET")).transpose()
    }

    /// Delete a team. Cars keep their (now dangling) team id. Returns rows deleted.
    pub async fn delete(&self, team_id: i64) -> Result<u64, DbError> {
        self.session
            .execute("DELETE FROM TEAMS.TEAMS WHERE TEAM_ID = ?", &[team_id.into()])
            .await
    }
}
