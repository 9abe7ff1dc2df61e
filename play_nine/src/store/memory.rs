use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

use super::{TableStore, errors::StoreResult};
use crate::game::{Table, TableName};

/// In-process store for tests and throwaway servers.
///
/// Records are kept serialized so loads hand out fresh copies exactly like
/// the file store does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<TableName, String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The stored JSON for a table, if any.
    pub async fn raw(&self, name: &TableName) -> Option<String> {
        self.tables.lock().await.get(name).cloned()
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn load(&self, name: &TableName) -> StoreResult<Option<Table>> {
        let tables = self.tables.lock().await;
        match tables.get(name) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, table: &Table) -> StoreResult<()> {
        let json = serde_json::to_string(table)?;
        self.tables.lock().await.insert(table.name.clone(), json);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
