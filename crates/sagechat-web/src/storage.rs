use sagechat_store::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// `window.localStorage` as a key-value backend
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, JsValue> {
        let storage = crate::window()?
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is not available"))?;
        Ok(Self { storage })
    }
}

fn backend_error(key: &str, err: JsValue) -> StoreError {
    StoreError::Backend {
        key: key.to_string(),
        message: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

impl KeyValueStore for LocalStorage {
    fn load(&self, key: &str) -> sagechat_store::Result<Option<String>> {
        self.storage.get_item(key).map_err(|e| backend_error(key, e))
    }

    fn save(&mut self, key: &str, value: &str) -> sagechat_store::Result<()> {
        // Quota errors surface here
        self.storage.set_item(key, value).map_err(|e| backend_error(key, e))
    }

    fn remove(&mut self, key: &str) -> sagechat_store::Result<()> {
        self.storage.remove_item(key).map_err(|e| backend_error(key, e))
    }
}
