//! Store (libSQL) configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    String::from(".fenceline/fenceline.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Local database file, or `":memory:"`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Lock file that keeps epochs over this store from overlapping across
    /// processes. `None` for an in-memory store, which no other process sees.
    #[must_use]
    pub fn epoch_lock_path(&self) -> Option<PathBuf> {
        (!self.is_in_memory()).then(|| PathBuf::from(format!("{}.epoch.lock", self.path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_the_database() {
        let config = StoreConfig::default();
        assert_eq!(
            config.epoch_lock_path(),
            Some(PathBuf::from(".fenceline/fenceline.db.epoch.lock"))
        );
    }

    #[test]
    fn in_memory_store_has_no_lock_file() {
        let config = StoreConfig {
            path: String::from(":memory:"),
        };
        assert_eq!(config.epoch_lock_path(), None);
    }
}
