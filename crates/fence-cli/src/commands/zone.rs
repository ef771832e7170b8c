use fence_core::ids::ZoneId;
use fence_db::repos::zone::ZoneUpdate;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ZoneCommands;
use crate::commands::shared::geometry::parse_geometry_arg;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence zone`.
pub async fn handle(action: &ZoneCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = &ctx.store;
    match action {
        ZoneCommands::Create { name, geometry } => {
            let geometry = parse_geometry_arg(geometry)?;
            output(&store.create_zone(name, &geometry).await?, flags.format)
        }
        ZoneCommands::Get { id } => output(&store.get_zone(ZoneId(*id)).await?, flags.format),
        ZoneCommands::List => output(&store.list_zones().await?, flags.format),
        ZoneCommands::Update { id, name, geometry } => {
            let update = ZoneUpdate {
                name: name.clone(),
                geometry: geometry.as_deref().map(parse_geometry_arg).transpose()?,
            };
            output(&store.update_zone(ZoneId(*id), update).await?, flags.format)
        }
        ZoneCommands::Delete { id } => {
            store.delete_zone(ZoneId(*id)).await?;
            output(&json!({ "zone_id": id, "deleted": true }), flags.format)
        }
    }
}
