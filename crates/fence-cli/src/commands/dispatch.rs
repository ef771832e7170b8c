use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Serve => commands::serve::handle(ctx, flags).await,
        Commands::Epoch { action } => commands::epoch::handle(&action, ctx, flags).await,
        Commands::Vehicle { action } => commands::vehicle::handle(&action, ctx, flags).await,
        Commands::Zone { action } => commands::zone::handle(&action, ctx, flags).await,
        Commands::Mapping => commands::mapping::handle(ctx, flags).await,
        Commands::History(args) => commands::history::handle(&args, ctx, flags).await,
        Commands::Counter { action } => commands::counter::handle(&action, ctx, flags).await,
    }
}
