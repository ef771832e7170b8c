use clap::{Args, Subcommand};

use crate::cli::subcommands::{CounterCommands, EpochCommands, VehicleCommands, ZoneCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run epochs on the configured cadence until interrupted. SIGUSR1
    /// triggers an extra epoch.
    Serve,
    /// Evaluation epochs.
    Epoch {
        #[command(subcommand)]
        action: EpochCommands,
    },
    /// Vehicle positions.
    Vehicle {
        #[command(subcommand)]
        action: VehicleCommands,
    },
    /// Zone polygons.
    Zone {
        #[command(subcommand)]
        action: ZoneCommands,
    },
    /// Vehicles with their assigned zones and visit counters.
    Mapping,
    /// Assignment history, newest first.
    History(HistoryArgs),
    /// Visit counters.
    Counter {
        #[command(subcommand)]
        action: CounterCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct HistoryArgs {
    /// Only this vehicle
    #[arg(long)]
    pub vehicle: Option<String>,
    /// Max rows
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
}
