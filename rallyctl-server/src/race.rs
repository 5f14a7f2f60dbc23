//! Race runs: simulate every eligible car and book the outcome
//!
//! A run reads teams and cars, simulates lap times locally, then writes the
//! race, its results and the budget movements in a single transaction.

use std::collections::HashMap;

use rallyctl_core::{rank, simulate_time_minutes, Entry, RaceDefaults, RaceSettings, Standing};
use rand::Rng;
use serde::Serialize;

use crate::db::{
    CarRepo, DbError, FinanceRepo, RaceRepo, RaceResult, ResultRow, Session, Team, TeamRepo,
};

#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("No cars available. Add cars first.")]
    NoEligibleCars,

    #[error("race was inserted but its id could not be read back")]
    MissingRaceId,
}

/// One line of the before/after budget table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetChange {
    pub team: String,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

/// Everything a finished race shows to the user
#[derive(Debug, Clone, Serialize)]
pub struct RaceOutcome {
    pub race_id: i64,
    pub track_name: String,
    pub winner_team_id: i64,
    pub winner_team_name: String,
    /// Stored results, best position first
    pub results: Vec<RaceResult>,
    /// Sorted by team name
    pub budgets: Vec<BudgetChange>,
}

impl RaceOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Race {} finished! Winner: {}",
            self.race_id, self.winner_team_name
        )
    }
}

/// Run one race and persist it.
///
/// Cars whose team is missing (never assigned, or deleted) do not start.
pub async fn run_race<R: Rng + ?Sized>(
    session: &mut Session,
    settings: &RaceSettings,
    defaults: &RaceDefaults,
    rng: &mut R,
) -> Result<RaceOutcome, RaceError> {
    let teams_before = TeamRepo::new(session).list().await?;
    let cars = CarRepo::new(session).list().await?;

    let team_names: HashMap<i64, &str> = teams_before
        .iter()
        .map(|t| (t.team_id, t.team_name.as_str()))
        .collect();

    let track = settings.track();
    let entries: Vec<Entry> = cars
        .iter()
        .filter_map(|car| {
            let team_id = car.team_id.filter(|id| team_names.contains_key(id))?;
            Some(Entry {
                car_id: car.car_id,
                team_id,
                time_minutes: simulate_time_minutes(
                    car.stats(),
                    track.factor,
                    defaults.variability,
                    defaults.distance_km,
                    rng,
                ),
            })
        })
        .collect();

    if entries.is_empty() {
        return Err(RaceError::NoEligibleCars);
    }
    if entries.len() < cars.len() {
        tracing::warn!(
            skipped = cars.len() - entries.len(),
            "cars without an existing team do not start"
        );
    }

    let standings = rank(entries);
    let winner_team_id = standings[0].team_id;
    tracing::info!(
        track = %track.name,
        cars = standings.len(),
        winner_team_id,
        "race simulated"
    );

    let race_id = {
        let tx = session.begin().await?;
        match record(&tx, &track.name, &standings, winner_team_id, settings).await {
            Ok(race_id) => {
                tx.commit().await?;
                race_id
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback after failed race failed");
                }
                return Err(err);
            }
        }
    };

    let results = RaceRepo::new(session).results(race_id).await?;
    let teams_after = TeamRepo::new(session).list().await?;
    let budgets = budget_changes(&teams_before, &teams_after);

    tracing::info!(race_id, "race recorded");
    Ok(RaceOutcome {
        race_id,
        track_name: track.name.clone(),
        winner_team_id,
        winner_team_name: team_names
            .get(&winner_team_id)
            .map(|name| name.to_string())
            .unwrap_or_default(),
        results,
        budgets,
    })
}

/// All writes of one race; the caller owns the transaction.
async fn record(
    session: &Session,
    track_name: &str,
    standings: &[Standing],
    winner_team_id: i64,
    settings: &RaceSettings,
) -> Result<i64, RaceError> {
    let races = RaceRepo::new(session);
    let race_id = races
        .create(track_name)
        .await?
        .ok_or(RaceError::MissingRaceId)?;

    let rows: Vec<ResultRow> = standings
        .iter()
        .map(|s| ResultRow {
            car_id: s.car_id,
            time_taken: s.time_minutes,
            position: s.position,
        })
        .collect();
    races.insert_results(race_id, &rows).await?;
    races.set_winner(race_id, winner_team_id).await?;

    let finance = FinanceRepo::new(session);
    let charged = finance.pay_participation_fee(settings.fee()).await?;
    finance.credit_prize(winner_team_id, settings.prize()).await?;
    tracing::debug!(race_id, charged, "fees and prize booked");

    Ok(race_id)
}

/// Before/after budgets for every team that existed before the race.
///
/// A team gone afterwards reports an after-budget of 0.
pub fn budget_changes(before: &[Team], after: &[Team]) -> Vec<BudgetChange> {
    let after: HashMap<i64, f64> = after.iter().map(|t| (t.team_id, t.budget)).collect();

    let mut rows: Vec<BudgetChange> = before
        .iter()
        .map(|team| {
            let after = after.get(&team.team_id).copied().unwrap_or(0.0);
            BudgetChange {
                team: team.team_name.clone(),
                before: team.budget,
                after,
                delta: ((after - team.budget) * 100.0).round() / 100.0,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.team.cmp(&b.team));
    rows
}
