use clap::Subcommand;

/// Zone commands. Geometry is GeoJSON (Polygon or a Feature wrapping one),
/// inline or as `@path/to/file.json`.
#[derive(Clone, Debug, Subcommand)]
pub enum ZoneCommands {
    /// Create a zone.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        geometry: String,
    },
    /// Get a zone by ID.
    Get { id: i64 },
    /// List zones.
    List,
    /// Update a zone's name and/or geometry.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        geometry: Option<String>,
    },
    /// Delete a zone with its history and counters.
    Delete { id: i64 },
}
