use habit_core::storage::{KeyValueStorage, StorageError};
use web_sys::Storage;

/// `window.localStorage`, or nothing when the browser refuses access.
pub struct LocalStorage {
    inner: Option<Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            tracing::warn!("localStorage unavailable, habits will not persist");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&Storage, StorageError> {
        self.inner
            .as_ref()
            .ok_or_else(|| StorageError::Backend("localStorage unavailable".to_string()))
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Backend(format!("{err:?}")))
    }
}
