//! Race and race result repository

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;

use crate::db::{DbError, Row, Session, Value};

/// Race record with the winner's name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Race {
    pub race_id: i64,
    pub track_name: String,
    pub winner_team_id: Option<i64>,
    pub winner_team_name: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl Race {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let created_at = row
            .get::<Option<String>>("CREATED_AT")?
            .map(|raw| parse_timestamp_ntz(&raw).ok_or_else(|| DbError::decode("CREATED_AT", raw)))
            .transpose()?;

        Ok(Self {
            race_id: row.get("RACE_ID")?,
            track_name: row.get("TRACK_NAME")?,
            winner_team_id: row.get("WINNER_TEAM_ID")?,
            winner_team_name: row.get("WINNER_TEAM_NAME")?,
            created_at,
        })
    }
}

/// TIMESTAMP_NTZ cells arrive as `<epoch seconds>.<nanoseconds>`.
fn parse_timestamp_ntz(raw: &str) -> Option<NaiveDateTime> {
    let (secs, frac) = raw.split_once('.').unwrap_or((raw, "0"));
    let secs: i64 = secs.parse().ok()?;
    // right-pad so "5" means 500ms, as in "1700000000.5"
    let digits: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
    let nanos: u32 = digits.parse().ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

/// Result row joined with car and team names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    pub result_id: i64,
    pub race_id: i64,
    pub car_id: i64,
    pub car_name: Option<String>,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    /// Minutes, lower is better
    pub time_taken: f64,
    pub position: i64,
}

impl RaceResult {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            result_id: row.get("RESULT_ID")?,
            race_id: row.get("RACE_ID")?,
            car_id: row.get("CAR_ID")?,
            car_name: row.get("CAR_NAME")?,
            team_id: row.get("TEAM_ID")?,
            team_name: row.get("TEAM_NAME")?,
            time_taken: row.get("TIME_TAKEN")?,
            position: row.get("POSITION")?,
        })
    }
}

/// One car's finish, as written to RACE_RESULTS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRow {
    pub car_id: i64,
    pub time_taken: f64,
    pub position: i64,
}

/// Race repository
pub struct RaceRepo<'a> {
    session: &'a Session,
}

impl<'a> RaceRepo<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Insert a race and return its id.
    ///
    /// The warehouse has no RETURNING clause, so the id is read back as
    /// `MAX(RACE_ID)`. Run inside a transaction to keep the pair consistent.
    pub async fn create(&self, track_name: &str) -> Result<Option<i64>, DbError> {
        self.session
            .execute(
                "INSERT INTO RACES.RACES (TRACK_NAME) VALUES (?)",
                &[track_name.into()],
            )
            .await?;

        let race_id = self
            .session
            .fetch_one_value("SELECT MAX(RACE_ID) FROM RACES.RACES", &[])
            .await?;
        race_id.map(|v| v.extract("RACE_ID")).transpose()
    }

    /// Record the winning team. Returns races updated.
    pub async fn set_winner(&self, race_id: i64, winner_team_id: i64) -> Result<u64, DbError> {
        self.session
            .execute(
                r#"
                UPDATE RACES.RACES
                SET WINNER_TEAM_ID = ?
                WHERE RACE_ID = ?
                "#,
                &[winner_team_id.into(), race_id.into()],
            )
            .await
    }

    /// Store every car's finish in one batched statement. Returns rows inserted.
    pub async fn insert_results(&self, race_id: i64, results: &[ResultRow]) -> Result<u64, DbError> {
        let batch: Vec<Vec<Value>> = results
            .iter()
            .map(|r| {
                vec![
                    race_id.into(),
                    r.car_id.into(),
                    r.time_taken.into(),
                    r.position.into(),
                ]
            })
            .collect();

        self.session
            .execute_many(
                r#"
                INSERT INTO RACES.RACE_RESULTS (RACE_ID, CAR_ID, TIME_TAKEN, POSITION)
                VALUES (?, ?, ?, ?)
                "#,
                &batch,
            )
            .await
    }

    /// Results of one race with car and team names, best position first.
    pub async fn results(&self, race_id: i64) -> Result<Vec<RaceResult>, DbError> {
        let rows = self
            .session
            .fetch_all(
                r#"
                SELECT rr.RESULT_ID,
                       rr.RACE_ID,
                       rr.CAR_ID,
                       c.CAR_NAME,
                       c.TEAM_ID,
                       t.TEAM_NAME,
                       rr.TIME_TAKEN,
                       rr.POSITION
                FROM RACES.RACE_RESULTS rr
                LEFT JOIN CARS.CARS c
                    ON rr.CAR_ID = c.CAR_ID
                LEFT JOIN TEAMS.TEAMS t
                    ON c.TEAM_ID = t.TEAM_ID
                WHERE rr.RACE_ID = ?
                ORDER BY rr.POSITION ASC
                "#,
                &[race_id.into()],
            )
            .await?;
        rows.iter().map(RaceResult::from_row).collect()
    }

    /// All races, newest first, with the winner's team name.
    pub async fn list(&self) -> Result<Vec<Race>, DbError> {
        let rows = self
            .session
            .fetch_all(
                r#"
                SELECT r.RACE_ID,
                       r.TRACK_NAME,
                       r.WINNER_TEAM_ID,
                       t.TEAM_NAME AS WINNER_TEAM_NAME,
                       r.CREATED_AT
                FROM RACES.RACES r
                LEFT JOIN TEAMS.TEAMS t
                    ON r.WINNER_TEAM_ID = t.TEAM_ID
                ORDER BY r.RACE_ID DESC
                "#,
                &[],
            )
            .await?;
        rows.iter().map(Race::from_row).collect()
    }
}
