use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `fence` binary.
#[derive(Debug, Parser)]
#[command(name = "fence", version, about = "Fenceline - vehicle geofencing engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database path (overrides store.path)
    #[arg(long, global = true)]
    pub db: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::subcommands::{CounterCommands, EpochCommands, VehicleCommands, ZoneCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["fence", "--format", "raw", "--verbose", "mapping"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Mapping));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["fence", "epoch", "run", "--quiet", "--db", ":memory:"])
            .expect("cli should parse");

        assert!(cli.quiet);
        assert_eq!(cli.global_flags().db.as_deref(), Some(":memory:"));
        assert!(matches!(
            cli.command,
            Commands::Epoch {
                action: EpochCommands::Run
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["fence", "--format", "table", "mapping"]).is_err());
    }

    #[test]
    fn vehicle_report_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "fence", "vehicle", "report", "taxi-1", "--lon", "-73.98", "--lat", "40.75",
        ])
        .expect("cli should parse");

        match cli.command {
            Commands::Vehicle {
                action: VehicleCommands::Report { id, lon, lat, at },
            } => {
                assert_eq!(id, "taxi-1");
                assert_eq!((lon, lat), (-73.98, 40.75));
                assert!(at.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn zone_update_fields_are_optional() {
        let cli = Cli::try_parse_from(["fence", "zone", "update", "3", "--name", "Depot"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Zone {
                action: ZoneCommands::Update {
                    id: 3,
                    name: Some(_),
                    geometry: None
                }
            }
        ));
    }

    #[test]
    fn counter_get_takes_vehicle_and_zone() {
        let cli = Cli::try_parse_from(["fence", "counter", "get", "taxi-1", "2"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Counter {
                action: CounterCommands::Get { zone: 2, .. }
            }
        ));
    }
}
