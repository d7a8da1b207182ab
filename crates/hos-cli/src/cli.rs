//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::change::ChangeArgs;
use crate::commands::export::ExportArgs;
use crate::commands::finalize::FinalizeArgs;
use crate::commands::geocode::GeocodeArgs;
use crate::commands::grid::GridArgs;
use crate::commands::logs::LogsArgs;
use crate::commands::route::RouteArgs;
use crate::commands::status::StatusArgs;
use crate::commands::sync::SyncArgs;
use crate::commands::trip::TripArgs;

/// Hours-of-service duty log.
///
/// Records duty-status changes for the current log day, closes each day into
/// a daily log, and keeps those logs in sync with the log service.
#[derive(Debug, Parser)]
#[command(name = "hos", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the open log day.
    Status(StatusArgs),

    /// Record a duty-status change.
    Change(ChangeArgs),

    /// Close the open log day into a daily log.
    Finalize(FinalizeArgs),

    /// Draw a log day on the 24-hour grid.
    Grid(GridArgs),

    /// List finalized daily logs.
    Logs(LogsArgs),

    /// Export finalized daily logs as JSON.
    Export(ExportArgs),

    /// Push unsynced daily logs to the log service.
    Sync(SyncArgs),

    /// Show or edit driver, vehicle and trip details.
    Trip(TripArgs),

    /// Plan the current trip's route.
    Route(RouteArgs),

    /// Resolve addresses to coordinates.
    Geocode(GeocodeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;
    use hos_core::DutyCategory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn change_parses_status_names() {
        let cli =
            Cli::try_parse_from(["hos", "change", "sleeper", "--location", "Reno, NV"]).unwrap();
        let Some(Commands::Change(args)) = cli.command else {
            panic!("expected change command");
        };
        assert_eq!(args.status, DutyCategory::SleeperBerth);
        assert_eq!(args.location, "Reno, NV");
        assert!(!args.automatic);

        assert!(Cli::try_parse_from(["hos", "change", "napping"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli =
            Cli::try_parse_from(["hos", "status", "--verbose", "--config", "hos.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("hos.toml")));
    }
}
