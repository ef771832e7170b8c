use clap::Subcommand;

/// Counter commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CounterCommands {
    /// Get the counter for one vehicle and zone.
    Get { vehicle: String, zone: i64 },
    /// List all counters.
    List,
}
