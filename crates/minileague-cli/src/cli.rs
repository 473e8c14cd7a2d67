// Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use minileague_core::app::DEFAULT_TOP_LIMIT;

/// Mini-league statistics from the Fantasy Premier League API
#[derive(Debug, Parser)]
#[command(name = "minileague", version)]
#[command(about = "Mini-league statistics from the Fantasy Premier League API", long_about = None)]
pub struct Cli {
    /// League to query (defaults to `league.default_league_id` from config)
    #[arg(short, long, global = true)]
    pub league: Option<u64>,

    /// Directory holding `config/` and `defaults/`
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Output format; CSV applies to views with a row list
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableScope {
    Season,
    Gameweek,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current, total and completed gameweeks
    Season,
    /// List the available statistic types
    Stats,
    /// Resolve a league and show its members
    League {
        /// Classic league id
        id: u64,
    },
    /// Compute one statistic for the league
    Stat {
        /// ownership, captaincy, transfers, rankings, unique or representation
        kind: String,
        #[arg(short, long)]
        gameweek: Option<u32>,
    },
    /// Season or gameweek standings
    Table {
        #[arg(value_enum)]
        scope: TableScope,
        /// Only used for the gameweek table
        #[arg(short, long)]
        gameweek: Option<u32>,
    },
    /// Gameweek digest: averages, extremes and transfer activity
    Summary {
        #[arg(short, long)]
        gameweek: Option<u32>,
    },
    /// Best teams and players of a gameweek
    Top {
        #[arg(short, long)]
        gameweek: Option<u32>,
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,
    },
    /// Slot-by-slot points for one member team
    Breakdown {
        /// Team (entry) id
        entry: u64,
        #[arg(short, long)]
        gameweek: Option<u32>,
    },
    /// Gameweek deadlines for the season
    Deadlines,
}

impl Command {
    /// Whether the command needs a league to be selected first.
    pub fn is_league_scoped(&self) -> bool {
        !matches!(
            self,
            Command::Season | Command::Stats | Command::League { .. } | Command::Deadlines
        )
    }
}
