use fence_config::FenceConfig;

use crate::cli::GlobalFlags;

/// Load layered configuration (with `.env`), then apply CLI overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<FenceConfig> {
    let mut config = FenceConfig::load_with_dotenv()?;
    if let Some(db) = &flags.db {
        config.store.path.clone_from(db);
    }
    Ok(config)
}
