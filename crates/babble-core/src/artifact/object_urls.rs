use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, error};
use uuid::Uuid;

const URL_PREFIX: &str = "blob:babble/";

/// Registry of resolvable URLs for packaged recordings.
///
/// A URL stays resolvable until revoked; revoking drops the registry's
/// reference to the bytes.
#[derive(Clone, Default)]
pub struct ObjectUrls {
    entries: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl ObjectUrls {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `data` and return its URL.
    pub fn create(&self, data: Arc<[u8]>) -> String {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        debug!(url = %url, bytes = data.len(), "Object URL created");
        self.lock().insert(url.clone(), data);
        url
    }

    /// Look up the bytes behind `url`.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    /// Release `url`. Returns `false` if it was not registered.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "Object URL revoked");
        }
        removed
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no URL is live.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(|e| {
            error!("Object URL registry lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
