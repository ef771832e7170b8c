use clap::Subcommand;

/// Vehicle commands.
#[derive(Clone, Debug, Subcommand)]
pub enum VehicleCommands {
    /// Report a position, creating the vehicle if needed.
    Report {
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Report time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Create a vehicle; no-op if it exists.
    Create {
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
    /// Move an existing vehicle.
    Update {
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
    /// Get a vehicle by ID.
    Get { id: String },
    /// List vehicles.
    List,
    /// Delete a vehicle.
    Delete { id: String },
}
