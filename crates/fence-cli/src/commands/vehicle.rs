use chrono::{DateTime, Utc};
use fence_core::ids::EntityId;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::VehicleCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence vehicle`.
pub async fn handle(action: &VehicleCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = &ctx.store;
    match action {
        VehicleCommands::Report { id, lon, lat, at } => {
            let at = match at {
                Some(raw) => DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc),
                None => Utc::now(),
            };
            let position = store
                .report_position(&EntityId::new(id.as_str()), *lon, *lat, at)
                .await?;
            output(&position, flags.format)
        }
        VehicleCommands::Create { id, lon, lat } => {
            let vehicle_id = EntityId::new(id.as_str());
            let created = store.create_vehicle(&vehicle_id, *lon, *lat).await?;
            output(&json!({ "vehicle_id": vehicle_id, "created": created }), flags.format)
        }
        VehicleCommands::Update { id, lon, lat } => {
            let position = store
                .update_vehicle(&EntityId::new(id.as_str()), *lon, *lat)
                .await?;
            output(&position, flags.format)
        }
        VehicleCommands::Get { id } => {
            let position = store.get_vehicle(&EntityId::new(id.as_str())).await?;
            output(&position, flags.format)
        }
        VehicleCommands::List => output(&store.list_vehicles().await?, flags.format),
        VehicleCommands::Delete { id } => {
            store.delete_vehicle(&EntityId::new(id.as_str())).await?;
            output(&json!({ "vehicle_id": id, "deleted": true }), flags.format)
        }
    }
}
