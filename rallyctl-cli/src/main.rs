mod commands;
mod tracing_setup;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use commands::{run_check, run_race, run_schema, run_serve, RaceArgs, SchemaCommands, ServeArgs};
use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rallyctl",
    author,
    version,
    about = "Bootcamp Rally: teams, cars and races on Snowflake"
)]
struct Cli {
    /// Config file (default: ./rallyctl.toml, then ~/.rallyctl/config.toml)
    #[arg(long, global = true, env = "RALLYCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Test the Snowflake connection and print what the session sees
    Check,
    /// Serve the web UI
    Serve(ServeArgs),
    /// Manage the rally schemas and tables
    #[command(subcommand)]
    Schema(SchemaCommands),
    /// Run one race from the command line
    Race(RaceArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Check => run_check().await?,
        Commands::Serve(args) => run_serve(args, config_path).await?,
        Commands::Schema(cmd) => run_schema(cmd).await?,
        Commands::Race(args) => run_race(args, config_path).await?,
        Commands::Completions(args) => run_completions(args),
    }

    Ok(())
}

fn run_completions(args: CompletionsArgs) {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
    };

    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
