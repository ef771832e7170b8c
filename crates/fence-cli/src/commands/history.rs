use fence_core::ids::EntityId;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::HistoryArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence history`.
pub async fn handle(args: &HistoryArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let vehicle = args.vehicle.as_deref().map(EntityId::new);
    let assignments = ctx
        .store
        .list_assignments(vehicle.as_ref(), args.limit)
        .await?;
    output(&assignments, flags.format)
}
