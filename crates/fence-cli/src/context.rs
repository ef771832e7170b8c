use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use fence_config::FenceConfig;
use fence_db::service::FenceStore;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub store: Arc<FenceStore>,
    pub config: FenceConfig,
}

impl AppContext {
    /// Open the configured store, creating its directory if needed.
    pub async fn init(config: FenceConfig) -> anyhow::Result<Self> {
        let path = &config.store.path;
        if !config.store.is_in_memory() {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }

        let store = FenceStore::new_local(path)
            .await
            .with_context(|| format!("failed to open store at {path}"))?;
        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }
}
