//! Cross-process epoch exclusion.
//!
//! The lock is a file created with `create_new` and holding the owner's pid.
//! It is removed when the guard drops. A file whose pid is no longer running
//! is treated as stale and replaced.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::EngineError;

/// Held for the duration of one epoch.
#[derive(Debug)]
pub struct EpochLock {
    path: PathBuf,
}

impl Drop for EpochLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    /// Created but the owner has not written its pid yet.
    Starting,
    Stale(i32),
    Unknown(String),
}

impl EpochLock {
    /// Take the lock at `path` without waiting.
    ///
    /// Returns `Ok(None)` if a live process holds it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Lock` if the lock file cannot be created or its
    /// contents cannot be read as a pid.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, EngineError> {
        // a second attempt covers the stale-file replacement
        for _ in 0..2 {
            match try_create(path) {
                Ok(lock) => return Ok(Some(lock)),
                Err(LockState::HeldBy(pid)) => {
                    debug!(pid, path = %path.display(), "epoch lock held by another process");
                    return Ok(None);
                }
                Err(LockState::Starting) => return Ok(None),
                Err(LockState::Stale(pid)) => {
                    warn!(pid, path = %path.display(), "removing stale epoch lock");
                    let _ = std::fs::remove_file(path);
                }
                Err(LockState::Unknown(reason)) => return Err(EngineError::lock(path, reason)),
            }
        }
        Err(EngineError::lock(
            path,
            "lock file reappeared after removing a stale one; remove it if no fence process is running",
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn try_create(path: &Path) -> Result<EpochLock, LockState> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new().create_new(true).write(true).open(path) {
        Ok(mut file) => {
            let pid = std::process::id();
            let _ = writeln!(file, "{pid}");
            Ok(EpochLock {
                path: path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            let mut contents = String::new();
            OpenOptions::new()
                .read(true)
                .open(path)
                .and_then(|mut file| file.read_to_string(&mut contents))
                .map_err(|e| LockState::Unknown(format!("cannot read lock file: {e}")))?;

            let contents = contents.trim();
            if contents.is_empty() {
                return Err(LockState::Starting);
            }
            match contents.parse::<i32>() {
                Ok(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Ok(pid) => Err(LockState::Stale(pid)),
                Err(_) => Err(LockState::Unknown(format!(
                    "lock file does not hold a pid ('{contents}'); remove it if no fence process is running"
                ))),
            }
        }
        Err(err) => Err(LockState::Unknown(format!("cannot create lock file: {err}"))),
    }
}

fn is_process_running(pid: i32) -> bool {
    if u32::try_from(pid).is_ok_and(|pid| pid == std::process::id()) {
        return true;
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
