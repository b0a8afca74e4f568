//! Process-local object URLs.
//!
//! An [`ObjectUrl`] (`blob:resumind/<uuid>`) names an immutable byte blob kept
//! in an [`ObjectUrlStore`] until it is revoked or evicted. A store holds at
//! most `capacity` blobs; creating one more drops the oldest. The default
//! converter registers its PNGs in [`global_store`]; the upload server
//! resolves them from there.

use once_cell::sync::Lazy;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

pub const OBJECT_URL_PREFIX: &str = "blob:resumind/";

/// Blobs kept per store before the oldest is evicted.
pub const DEFAULT_OBJECT_CAPACITY: usize = 64;

static GLOBAL_STORE: Lazy<Arc<ObjectUrlStore>> = Lazy::new(|| Arc::new(ObjectUrlStore::new()));

/// The store shared by the process-default converter.
pub fn global_store() -> Arc<ObjectUrlStore> {
    Arc::clone(&GLOBAL_STORE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectUrl(Uuid);

impl ObjectUrl {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECT_URL_PREFIX}{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidObjectUrl(pub String);

impl fmt::Display for InvalidObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not an object URL: '{}'", self.0)
    }
}

impl std::error::Error for InvalidObjectUrl {}

impl FromStr for ObjectUrl {
    type Err = InvalidObjectUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(OBJECT_URL_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(ObjectUrl)
            .ok_or_else(|| InvalidObjectUrl(s.to_string()))
    }
}

/// A registered blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

/// Thread-safe, bounded registry of object URLs.
#[derive(Debug)]
pub struct ObjectUrlStore {
    capacity: usize,
    inner: RwLock<Objects>,
}

/// Blobs by id, plus ids in creation order for eviction.
#[derive(Debug, Default)]
struct Objects {
    by_id: HashMap<Uuid, StoredObject>,
    order: VecDeque<Uuid>,
}

impl Objects {
    fn remove(&mut self, id: &Uuid) -> bool {
        let removed = self.by_id.remove(id).is_some();
        if removed {
            self.order.retain(|o| o != id);
        }
        removed
    }
}

impl Default for ObjectUrlStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OBJECT_CAPACITY)
    }
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store keeping at most `capacity` blobs (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(Objects::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register `bytes` and return a fresh URL for them, evicting the oldest
    /// blobs beyond capacity.
    pub fn create(&self, mime_type: impl Into<String>, bytes: Arc<[u8]>) -> ObjectUrl {
        let id = Uuid::new_v4();
        let object = StoredObject {
            mime_type: mime_type.into(),
            bytes,
        };

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        while inner.order.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.by_id.remove(&oldest);
            debug!("Evicted object URL {}{}", OBJECT_URL_PREFIX, oldest);
        }
        inner.by_id.insert(id, object);
        inner.order.push_back(id);
        ObjectUrl(id)
    }

    pub fn get(&self, url: &ObjectUrl) -> Option<StoredObject> {
        self.get_by_id(&url.0)
    }

    pub fn get_by_id(&self, id: &Uuid) -> Option<StoredObject> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(id)
            .cloned()
    }

    /// Look up a URL given as text.
    pub fn resolve(&self, url: &str) -> Option<StoredObject> {
        url.parse::<ObjectUrl>().ok().and_then(|u| self.get(&u))
    }

    /// Drop the blob. Returns `false` if the URL was unknown, revoked or
    /// evicted.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        self.revoke_id(&url.0)
    }

    pub fn revoke_id(&self, id: &Uuid) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes held.
    pub fn total_bytes(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .values()
            .map(|o| o.bytes.len())
            .sum()
    }
}
