use std::sync::Arc;

use fence_db::service::FenceStore;
use fence_engine::EpochRunner;
use tracing::debug;

use crate::context::AppContext;

/// Build an epoch runner over the store. File-backed stores get the epoch
/// lock so `serve` and `epoch run` never overlap; counters are caught up
/// from the store at the start of every epoch.
pub fn epoch_runner(ctx: &AppContext) -> anyhow::Result<Arc<EpochRunner<FenceStore>>> {
    let mut runner = EpochRunner::new(Arc::clone(&ctx.store), &ctx.config)?;
    if let Some(lock_path) = ctx.config.store.epoch_lock_path() {
        debug!(lock = %lock_path.display(), "epochs guarded by lock file");
        runner = runner.with_lock_file(lock_path);
    }
    Ok(Arc::new(runner))
}
