//! Headless race run

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use rallyctl_core::{RaceSettings, RallyConfig};
use rallyctl_server::RaceOutcome;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Arguments for the race command
#[derive(Parser, Debug)]
pub struct RaceArgs {
    /// Track to race on (e.g. "Forest Run")
    #[arg(long, short = 't')]
    pub track: String,

    /// Participation fee charged to every team with cars (default: config)
    #[arg(long)]
    pub fee: Option<f64>,

    /// Prize credited to the winning team (default: config)
    #[arg(long)]
    pub prize: Option<f64>,

    /// Seed the simulation for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_race(args: RaceArgs, config_path: Option<&Path>) -> Result<()> {
    let config = RallyConfig::load(config_path).context("Failed to load configuration")?;
    let settings = RaceSettings::new(
        &args.track,
        args.fee.unwrap_or(config.race.fee),
        args.prize.unwrap_or(config.race.prize),
        &config.tracks,
    )
    .with_context(|| format!("Available tracks: {}", config.tracks.names().join(", ")))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut session = super::connect().await?;
    let outcome =
        rallyctl_server::run_race(&mut session, &settings, &config.race, &mut rng).await;
    session.close().await.context("Failed to close Snowflake session")?;
    let outcome = outcome.context("Race failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &RaceOutcome) {
    println!("{} ({})", outcome.summary(), outcome.track_name);
    println!();
    println!("{:>3}  {:<20} {:<20} {:>10}", "Pos", "Car", "Team", "Minutes");
    for result in &outcome.results {
        println!(
            "{:>3}  {:<20} {:<20} {:>10.2}",
            result.position,
            result.car_name.as_deref().unwrap_or("?"),
            result.team_name.as_deref().unwrap_or("?"),
            result.time_taken
        );
    }

    println!();
    println!("{:<20} {:>12} {:>12} {:>10}", "Team", "Before", "After", "Change");
    for change in &outcome.budgets {
        println!(
            "{:<20} {:>12.2} {:>12.2} {:>+10.2}",
            change.team, change.before, change.after, change.delta
        );
    }
}
