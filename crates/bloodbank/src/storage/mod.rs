//! Storage layer for bloodbank.
//!
//! Two collections, donors and patients, each live in one text slot of a
//! key-value store as a JSON array. Every mutation rewrites the whole slot.
//! Concurrent writers are last-write-wins.

pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use tracing::{debug, warn};

use crate::error::Result;
use crate::record::{Donor, Patient, Record, RecordKind};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A persistent map from slot keys to text.
pub trait KeyValueStore {
    /// Read a slot, `None` when it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a slot, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<bool>;
}

/// Loads and saves whole record collections.
#[derive(Debug)]
pub struct RecordStore<S> {
    kv: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Wrap a key-value store.
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// The underlying key-value store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.kv
    }

    /// Load the collection for `R`.
    ///
    /// An absent slot, or one whose text is not a JSON array of `R`, loads as
    /// an empty collection. The malformed text is left in place until the
    /// next save.
    ///
    /// # Errors
    ///
    /// Returns an error only if the key-value store itself fails.
    pub fn load<R: Record>(&self) -> Result<Vec<R>> {
        let key = R::KIND.slot_key();
        let Some(text) = self.kv.get(key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<R>>(&text) {
            Ok(records) => {
                debug!(slot = key, count = records.len(), "Loaded collection");
                Ok(records)
            }
            Err(e) => {
                warn!(slot = key, error = %e, "Stored collection is malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the collection for `R`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the key-value store fails.
    pub fn save<R: Record>(&mut self, records: &[R]) -> Result<()> {
        let key = R::KIND.slot_key();
        let text = serde_json::to_string(records)?;
        self.kv.set(key, &text)?;
        debug!(slot = key, count = records.len(), "Saved collection");
        Ok(())
    }

    /// All donors in stored order.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::load`].
    pub fn donors(&self) -> Result<Vec<Donor>> {
        self.load()
    }

    /// All patients in stored order.
    ///
    /// # Errors
    ///
    /// See [`RecordStore::load`].
    pub fn patients(&self) -> Result<Vec<Patient>> {
        self.load()
    }

    /// Drop a collection entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value store fails.
    pub fn clear(&mut self, kind: RecordKind) -> Result<bool> {
        self.kv.remove(kind.slot_key())
    }
}
