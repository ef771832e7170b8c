use anyhow::Context;
use fence_engine::{Scheduler, SchedulerHandle};
use serde_json::json;
use tracing::info;

use crate::cli::GlobalFlags;
use crate::commands::shared::runner::epoch_runner;
use crate::context::AppContext;
use crate::output::output;

/// Handle `fence serve`: run epochs until Ctrl-C. On Unix, SIGUSR1 triggers
/// an extra epoch.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let runner = epoch_runner(ctx)?;
    let (handle, task) = Scheduler::new(runner, &ctx.config.epoch).spawn();
    info!(
        interval_secs = ctx.config.epoch.interval_secs,
        store = %ctx.config.store.path,
        pid = std::process::id(),
        "serving"
    );

    wait_for_shutdown(&handle).await?;
    info!("shutdown requested");
    handle.shutdown();

    let completed = task.await.context("scheduler task failed")?;
    output(&json!({ "epochs_completed": completed }), flags.format)
}

#[cfg(unix)]
async fn wait_for_shutdown(handle: &SchedulerHandle) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    use tracing::debug;

    let mut manual =
        signal(SignalKind::user_defined1()).context("failed to listen for SIGUSR1")?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                return result.context("failed to listen for Ctrl-C");
            }
            Some(()) = manual.recv() => {
                if handle.trigger() {
                    info!("manual epoch requested");
                } else {
                    debug!("manual epoch already queued");
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_handle: &SchedulerHandle) -> anyhow::Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
}
