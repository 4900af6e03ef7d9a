//! Local key-value persistence.
//!
//! [`KeyValueStore`] is the minimal async storage capability the client
//! needs: whole values under fixed keys. [`FileStore`] keeps one JSON file
//! per key in a data directory; [`MemoryStore`] keeps values in a shared
//! map for tests and throwaway sessions.
//!
//! On top of it, [`CartStore`] persists the cart snapshot and
//! [`SessionStore`] the guest session, each under its own key.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::cart::OrderLine;
use crate::session::GuestSession;
use crate::{ConciergeError, Result};

/// Key holding the serialized cart lines.
pub const CART_KEY: &str = "room_service_cart";

/// Key holding the serialized guest session.
pub const SESSION_KEY: &str = "reservation_data";

/// Async whole-value storage under string keys.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads the value under `key`, `None` if nothing is stored.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;

    /// Deletes the value under `key`; deleting a missing key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write to a sibling file first so a crash never leaves half a snapshot.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Wrote snapshot");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value synchronously (test inspection helper).
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| ConciergeError::Storage("memory store lock poisoned".to_string()))?;
        Ok(f(&mut values))
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_values(|values| values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.with_values(|values| {
            values.insert(key.to_string(), value);
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.with_values(|values| {
            values.remove(key);
        })
    }
}

/// Snapshot persistence capability injected into the cart.
pub trait CartPersistence: Send + Sync + 'static {
    /// Loads the last saved lines, `None` if no snapshot exists.
    fn load(&self) -> impl Future<Output = Result<Option<Vec<OrderLine>>>> + Send;

    /// Replaces the stored snapshot with `lines`.
    fn save(&self, lines: &[OrderLine]) -> impl Future<Output = Result<()>> + Send;

    /// Deletes the stored snapshot.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Cart snapshot kept as a JSON array under [`CART_KEY`].
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    store: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Wraps a key-value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> CartPersistence for CartStore<S> {
    async fn load(&self) -> Result<Option<Vec<OrderLine>>> {
        let Some(raw) = self.store.get(CART_KEY).await? else {
            return Ok(None);
        };
        let lines = serde_json::from_str(&raw)
            .map_err(|e| ConciergeError::Storage(format!("corrupt cart snapshot: {e}")))?;
        Ok(Some(lines))
    }

    async fn save(&self, lines: &[OrderLine]) -> Result<()> {
        let raw = serde_json::to_string(lines)?;
        self.store.set(CART_KEY, raw).await
    }

    async fn clear(&self) -> Result<()> {
        self.store.remove(CART_KEY).await
    }
}

/// Guest session kept as a JSON object under [`SESSION_KEY`].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Wraps a key-value store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the saved session, `None` if the guest never signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the saved value is corrupt.
    pub async fn load(&self) -> Result<Option<GuestSession>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        let session = serde_json::from_str(&raw)
            .map_err(|e| ConciergeError::Storage(format!("corrupt session: {e}")))?;
        Ok(Some(session))
    }

    /// Saves the session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn save(&self, session: &GuestSession) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.store.set(SESSION_KEY, raw).await
    }

    /// Signs the guest out locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_KEY).await
    }
}
