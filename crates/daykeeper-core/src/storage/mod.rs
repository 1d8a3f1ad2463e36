mod kv;

pub use kv::{FileStore, KvStore, MemoryStore};

use std::path::PathBuf;

use crate::error::StoreError;

/// Store key holding the serialized [`State`](crate::State) snapshot.
pub const STATE_KEY: &str = "state";

/// Returns `~/.config/daykeeper[-dev]/`, based on DAYKEEPER_ENV.
///
/// Set DAYKEEPER_ENV=dev to use the development data directory, or
/// DAYKEEPER_DATA_DIR to point somewhere else entirely (tests use this).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var("DAYKEEPER_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYKEEPER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("daykeeper-dev")
            } else {
                base_dir.join("daykeeper")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDirFailed {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
