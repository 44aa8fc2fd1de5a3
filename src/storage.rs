use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

pub const GOALS_SLOT: &str = "goals";
pub const STATS_SLOT: &str = "user_stats";
pub const REFLECTION_SLOT: &str = "last_reflection_date";

/// Each slot is one pretty-printed JSON document named after its key.
pub fn slot_path(data_dir: &Path, key: &str) -> PathBuf {
    data_dir.join(format!("{key}.json"))
}

pub async fn load_slot<T>(data_dir: &Path, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let path = slot_path(data_dir, key);
    match fs::read(&path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => {
                error!(slot = key, "failed to parse {}: {err}", path.display());
                T::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => T::default(),
        Err(err) => {
            error!(slot = key, "failed to read {}: {err}", path.display());
            T::default()
        }
    }
}

pub async fn persist_slot<T: Serialize>(data_dir: &Path, key: &str, value: &T) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(value).map_err(AppError::internal)?;
    fs::write(slot_path(data_dir, key), payload)
        .await
        .map_err(|err| {
            error!(slot = key, "failed to write slot: {err}");
            AppError::internal(err)
        })?;
    Ok(())
}
