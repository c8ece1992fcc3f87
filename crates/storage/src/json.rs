//! JSON values on top of the raw key-value contract.

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{KeyValueStore, StorageError};

/// Loads and decodes the value under `key`.
///
/// A missing key or a value that fails to decode yields `T::default()`; the
/// decode failure is logged, never returned.
///
/// # Errors
///
/// Returns `StorageError` only when the store itself fails.
pub async fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!("ignoring malformed value under {key}: {err}");
            Ok(T::default())
        }
    }
}

/// Encodes `value` and writes it under `key`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails, or the store's
/// error if the write fails.
pub async fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    store.set(key, &raw).await
}
