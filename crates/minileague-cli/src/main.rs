// Mini-league statistics CLI.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (seeding config/ from defaults/ when missing)
// 3. Initialize tracing (stderr, so stdout carries only results)
// 4. Build the app, select the league when the command needs one
// 5. Run the command and print its result or error object

mod cli;
mod output;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use minileague_core::config::{self, Config};
use minileague_core::protocol::{self, ErrorBody, Reply};
use minileague_core::App;

use cli::{Cli, Command, TableScope};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(&cli).context("failed to load configuration")?;
    init_tracing(&config.logging.filter)?;
    info!(command = ?cli.command, "minileague starting");

    let league_id = cli.league.or(config.league.default_league_id);
    let app = App::new(config).context("failed to build upstream client")?;

    let reply = run(&app, &cli.command, league_id).await?;
    let value = serde_json::to_value(&reply).context("failed to serialize reply")?;
    let mut stdout = std::io::stdout().lock();
    output::emit(&mut stdout, &value, cli.format)?;

    let stats = app.cache_stats();
    debug!(hits = stats.hits, misses = stats.misses, entries = stats.entries, "cache usage");

    Ok(if reply.is_error() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config_dir {
        Some(dir) => {
            let copied = config::ensure_config_files(dir)
                .with_context(|| format!("failed to seed config in {}", dir.display()))?;
            for path in copied {
                eprintln!("created {}", path.display());
            }
            Ok(config::load_config_from(dir)?)
        }
        None => Ok(config::load_config()?),
    }
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the configured filter.
fn init_tracing(filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

async fn run(app: &App, command: &Command, league_id: Option<u64>) -> anyhow::Result<Reply<Value>> {
    if command.is_league_scoped() {
        if let Some(id) = league_id {
            if let Err(e) = app.set_league(id).await {
                return view::<()>(Err(e));
            }
        }
    }

    match command {
        Command::Season => view(app.season_info().await),
        Command::Stats => view(Ok(protocol::available_stats())),
        Command::League { id } => view(match app.set_league(*id).await {
            Ok(_) => app.league_status(),
            Err(e) => Err(e),
        }),
        Command::Stat { kind, gameweek } => view(app.stat(kind, *gameweek).await),
        Command::Table {
            scope: TableScope::Season,
            ..
        } => view(app.season_table().await),
        Command::Table {
            scope: TableScope::Gameweek,
            gameweek,
        } => view(app.gameweek_table(*gameweek).await),
        Command::Summary { gameweek } => view(app.summary(*gameweek).await),
        Command::Top { gameweek, limit } => view(app.top_performers(*gameweek, *limit).await),
        Command::Breakdown { entry, gameweek } => view(app.breakdown(*entry, *gameweek).await),
        Command::Deadlines => view(app.deadlines().await),
    }
}

/// Wrap a core result as a reply; league errors become the error object.
fn view<T: Serialize>(result: minileague_core::Result<T>) -> anyhow::Result<Reply<Value>> {
    match result {
        Ok(value) => Ok(Reply::Ok(
            serde_json::to_value(value).context("failed to serialize result")?,
        )),
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "command failed");
            Ok(Reply::Err(ErrorBody::from(&e)))
        }
    }
}
