//! `window.localStorage` as a key-value store.

use localchat_core::{KeyValueStore, StorageError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Records live under their key in the page's local storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    /// Move an unreadable record to `<key>.corrupt` so a fresh one can be
    /// written in its place.
    pub fn quarantine(&self, key: &str) -> Result<(), StorageError> {
        let storage = local_storage()?;
        if let Some(value) = storage.get_item(key).map_err(backend_error)? {
            storage
                .set_item(&format!("{}.corrupt", key), &value)
                .map_err(backend_error)?;
        }
        storage.remove_item(key).map_err(backend_error)
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?.get_item(key).map_err(backend_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Fails when the origin's quota is exhausted.
        local_storage()?.set_item(key, value).map_err(backend_error)
    }
}

fn local_storage() -> Result<Storage, StorageError> {
    web_sys::window()
        .ok_or_else(|| StorageError::Backend("no window".to_string()))?
        .local_storage()
        .map_err(backend_error)?
        .ok_or_else(|| StorageError::Backend("localStorage is unavailable".to_string()))
}

fn backend_error(error: JsValue) -> StorageError {
    StorageError::Backend(js_message(&error))
}

/// Best-effort text of a thrown JS value.
pub fn js_message(error: &JsValue) -> String {
    error
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(error, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", error))
}
