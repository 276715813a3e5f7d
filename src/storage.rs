use parallax_core::{KeyValueStore, MemoryStore};
use web_sys as web;

/// `localStorage` when the page may use it, otherwise an in-memory map that
/// lasts for the session.
pub enum PageStore {
    Local(web::Storage),
    Memory(MemoryStore),
}

impl PageStore {
    pub fn open() -> Self {
        match web::window().and_then(|w| w.local_storage().ok().flatten()) {
            Some(s) => Self::Local(s),
            None => {
                log::warn!("[storage] localStorage unavailable, counter will not persist");
                Self::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for PageStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Local(s) => s.get_item(key).ok().flatten(),
            Self::Memory(m) => m.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match self {
            Self::Local(s) => {
                // Quota and private-mode failures are not worth surfacing.
                if let Err(e) = s.set_item(key, value) {
                    log::debug!("[storage] set {} failed: {:?}", key, e);
                }
            }
            Self::Memory(m) => m.set(key, value),
        }
    }
}
