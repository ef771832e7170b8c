use anyhow::bail;
use fence_engine::EpochRun;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EpochCommands;
use crate::commands::shared::runner::epoch_runner;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence epoch`.
pub async fn handle(action: &EpochCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        EpochCommands::Run => {
            let runner = epoch_runner(ctx)?;
            match runner.run_epoch().await? {
                EpochRun::Completed(report) => output(&report, flags.format),
                EpochRun::AlreadyRunning => bail!(
                    "an epoch is already running against this store; to trigger one in a running `fence serve`, send it SIGUSR1"
                ),
            }
        }
    }
}
