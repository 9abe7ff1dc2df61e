//! Persistence for authoritative table records.
//!
//! Table actors load a table before each mutation and save it afterwards.
//! The [`TableStore`] trait keeps them independent of where records live.

use async_trait::async_trait;

use crate::game::{Table, TableName};

pub mod errors;
pub mod json_file;
pub mod memory;
pub mod timeouts;

pub use errors::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Load/save contract for table records
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    /// Load a table, or `None` if nobody has created it yet
    async fn load(&self, name: &TableName) -> StoreResult<Option<Table>>;

    /// Persist the full table record
    async fn save(&self, table: &Table) -> StoreResult<()>;
}

