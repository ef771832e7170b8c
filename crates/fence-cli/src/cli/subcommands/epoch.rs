use clap::Subcommand;

/// Epoch commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EpochCommands {
    /// Run one epoch now and print its report.
    Run,
}
