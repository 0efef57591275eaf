//! Local operation history.
//!
//! An append-only list of completed and pending operations, persisted to a
//! simple key-value store under a fixed storage key. The list is read once
//! on construction and rewritten in full on every mutation; there is no
//! incremental log.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chains::ChainKey;

/// Storage key under which the history list is kept.
pub const HISTORY_STORAGE_KEY: &str = "refuel.history.v1";

/// Status of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationStatus {
    /// Submitted, not yet confirmed.
    Pending,
    /// Confirmed by the provider.
    Completed,
    /// Failed or rejected.
    Failed,
}

/// Seconds since the Unix epoch, serialized as a stringified integer so
/// JSON consumers with double-precision numbers cannot lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// The current system time.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(secs)
    }

    /// Raw seconds since the epoch.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let secs = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(Self(secs))
    }
}

/// One recorded operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Source chain.
    pub from_chain: ChainKey,
    /// Destination chain.
    pub to_chain: ChainKey,
    /// Amount in native-token units, as entered.
    pub amount: String,
    /// Current status.
    pub status: OperationStatus,
    /// When the operation was recorded.
    pub timestamp: UnixTimestamp,
    /// Transaction hash, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Explorer link, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// Minimal key-value persistence boundary for the history list.
pub trait KvStore {
    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String);
    /// Removes the value stored under `key`.
    fn remove(&self, key: &str);
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn put(&self, key: &str, value: String) {
        (**self).put(key, value);
    }
    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory [`KvStore`]; contents vanish on process restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn put(&self, key: &str, value: String) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_owned(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(key);
        }
    }
}

/// Append-only operation history over a [`KvStore`].
#[derive(Debug)]
pub struct OperationHistory<S> {
    store: S,
    records: Vec<OperationRecord>,
}

impl<S: KvStore> OperationHistory<S> {
    /// Loads the history list from the store. Missing or unreadable data
    /// starts an empty history rather than failing startup.
    pub fn load(store: S) -> Self {
        let records = store
            .get(HISTORY_STORAGE_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable history payload");
                    None
                }
            })
            .unwrap_or_default();
        Self { store, records }
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Appends a record and rewrites the full list to the store.
    pub fn append(&mut self, record: OperationRecord) {
        self.records.push(record);
        self.persist();
    }

    /// Clears the history and removes the stored payload.
    pub fn clear(&mut self) {
        self.records.clear();
        self.store.remove(HISTORY_STORAGE_KEY);
    }

    fn persist(&self) {
        match serde_json::to_string(&self.records) {
            Ok(raw) => self.store.put(HISTORY_STORAGE_KEY, raw),
            Err(e) => tracing::warn!(error = %e, "failed to serialize history"),
        }
    }
}
