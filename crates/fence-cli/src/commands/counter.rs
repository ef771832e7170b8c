use anyhow::bail;
use fence_core::ids::{EntityId, ZoneId};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::CounterCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence counter`.
pub async fn handle(action: &CounterCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        CounterCommands::Get { vehicle, zone } => {
            match ctx
                .store
                .get_counter(&EntityId::new(vehicle.as_str()), ZoneId(*zone))
                .await?
            {
                Some(counter) => output(&counter, flags.format),
                None => bail!("no counter for vehicle {vehicle} in zone {zone}"),
            }
        }
        CounterCommands::List => output(&ctx.store.list_counters().await?, flags.format),
    }
}
