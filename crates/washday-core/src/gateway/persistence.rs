use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::PersistenceError;
use crate::model::CycleType;

/// Logical collections the core saves and loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    ClothingItems,
    Supplies,
    WashCycles,
    Timer(CycleType),
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::ClothingItems,
        Collection::Supplies,
        Collection::WashCycles,
        Collection::Timer(CycleType::Wash),
        Collection::Timer(CycleType::Dry),
    ];

    /// Stable storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::ClothingItems => "clothing_items",
            Collection::Supplies => "supplies",
            Collection::WashCycles => "wash_cycles",
            Collection::Timer(CycleType::Wash) => "timer.wash",
            Collection::Timer(CycleType::Dry) => "timer.dry",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Reads and writes inside one [`PersistenceGateway::transaction`].
pub trait StoreTxn {
    fn load(&mut self, collection: Collection) -> Result<Option<String>, PersistenceError>;

    fn save(&mut self, collection: Collection, payload: &str) -> Result<(), PersistenceError>;
}

/// Body of a transaction. Returning an error discards its writes.
pub type TxnBody<'a> = dyn FnMut(&mut dyn StoreTxn) -> Result<(), PersistenceError> + 'a;

/// Durable storage for encoded collections.
///
/// Payloads are opaque to the store. `load` returns `Ok(None)` for a
/// collection that was never saved. Several processes may share one store,
/// so read-modify-write sequences go through [`transaction`](Self::transaction).
pub trait PersistenceGateway: Send + Sync {
    fn save(&self, collection: Collection, payload: &str) -> Result<(), PersistenceError>;

    fn load(&self, collection: Collection) -> Result<Option<String>, PersistenceError>;

    fn clear(&self, collection: Collection) -> Result<(), PersistenceError>;

    /// Run `body` with no other writer of the same store interleaving.
    /// Its writes land together, or not at all when it fails.
    fn transaction(&self, body: &mut TxnBody<'_>) -> Result<(), PersistenceError>;
}

/// In-process store. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<&'static str, String>>, PersistenceError> {
        self.entries
            .lock()
            .map_err(|e| PersistenceError::QueryFailed(format!("Lock failed: {e}")))
    }
}

impl PersistenceGateway for MemoryStore {
    fn save(&self, collection: Collection, payload: &str) -> Result<(), PersistenceError> {
        self.entries()?.insert(collection.key(), payload.to_string());
        Ok(())
    }

    fn load(&self, collection: Collection) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries()?.get(collection.key()).cloned())
    }

    fn clear(&self, collection: Collection) -> Result<(), PersistenceError> {
        self.entries()?.remove(collection.key());
        Ok(())
    }

    fn transaction(&self, body: &mut TxnBody<'_>) -> Result<(), PersistenceError> {
        let mut entries = self.entries()?;
        // Work on a copy so a failed body leaves nothing behind.
        let mut scratch = entries.clone();
        body(&mut MemoryTxn(&mut scratch))?;
        *entries = scratch;
        Ok(())
    }
}

struct MemoryTxn<'a>(&'a mut HashMap<&'static str, String>);

impl StoreTxn for MemoryTxn<'_> {
    fn load(&mut self, collection: Collection) -> Result<Option<String>, PersistenceError> {
        Ok(self.0.get(collection.key()).cloned())
    }

    fn save(&mut self, collection: Collection, payload: &str) -> Result<(), PersistenceError> {
        self.0.insert(collection.key(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_distinct() {
        let mut keys: Vec<_> = Collection::ALL.iter().map(|c| c.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Collection::ALL.len());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load(Collection::Supplies).unwrap().is_none());
        store.save(Collection::Supplies, "[]").unwrap();
        assert_eq!(store.load(Collection::Supplies).unwrap().as_deref(), Some("[]"));
        store.clear(Collection::Supplies).unwrap();
        assert!(store.load(Collection::Supplies).unwrap().is_none());
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let store = MemoryStore::new();
        store.save(Collection::WashCycles, "[1]").unwrap();

        let result = store.transaction(&mut |txn| {
            txn.save(Collection::WashCycles, "[1,2]")?;
            assert_eq!(txn.load(Collection::WashCycles)?.as_deref(), Some("[1,2]"));
            Err(PersistenceError::Locked)
        });
        assert!(result.is_err());
        assert_eq!(store.load(Collection::WashCycles).unwrap().as_deref(), Some("[1]"));

        store
            .transaction(&mut |txn| txn.save(Collection::WashCycles, "[1,2]"))
            .unwrap();
        assert_eq!(store.load(Collection::WashCycles).unwrap().as_deref(), Some("[1,2]"));
    }
}
