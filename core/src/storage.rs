//! Key-value storage collaborator holding the session token.
//!
//! # Design
//! The device's persistent string store is external to this crate; all the
//! data layer needs is async load/save of single string keys, so that is the
//! whole trait. `save_string` returns a bool rather than an error — the
//! backing stores on the platforms this targets swallow write failures, and
//! callers only ever log a failed save. `MemoryStorage` is the in-process
//! implementation used by tests and by hosts that opt out of persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

/// Storage key under which the signed session token lives.
pub const TOKEN_KEY: &str = "@user:token";

/// Asynchronous single-key string storage.
///
/// Single-key reads and writes are assumed atomic; nothing beyond that is
/// required of an implementation.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Load the string stored under `key`, if any.
    async fn load_string(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. Returns false if the write failed.
    async fn save_string(&self, key: &str, value: &str) -> bool;
}

/// In-memory `TokenStorage` backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn load_string(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn save_string(&self, key: &str, value: &str) -> bool {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value.to_string());
                true
            }
            Err(_) => false,
        }
    }
}
