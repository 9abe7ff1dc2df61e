use async_trait::async_trait;
use log::debug;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::fs;

use super::{
    TableStore,
    errors::StoreResult,
    timeouts::{DEFAULT_STORE_TIMEOUT, with_timeout},
};
use crate::game::{Table, TableName};

/// Stores each table as pretty-printed JSON at `<data_dir>/<table>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated record behind.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    timeout: Duration,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, name: &TableName) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    async fn read(&self, name: &TableName) -> StoreResult<Option<Table>> {
        match fs::read(self.path(name)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, table: &Table) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(table)?;
        fs::create_dir_all(&self.data_dir).await?;
        let path = self.path(&table.name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!("saved {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TableStore for JsonFileStore {
    async fn load(&self, name: &TableName) -> StoreResult<Option<Table>> {
        with_timeout(self.timeout, self.read(name)).await
    }

    async fn save(&self, table: &Table) -> StoreResult<()> {
        with_timeout(self.timeout, self.write(table)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{game::PlayerName, store::StoreError};

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("play_nine_{tag}_{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_table_loads_as_none() {
        let store = JsonFileStore::new(temp_dir("missing"));
        let name = TableName::parse("ghost").unwrap();
        assert!(store.load(&name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = temp_dir("save");
        let store = JsonFileStore::new(&dir);
        let mut table = Table::new(TableName::parse("front-nine").unwrap());
        table.add_player(PlayerName::parse("alice").unwrap()).unwrap();
        table.add_player(PlayerName::parse("bob").unwrap()).unwrap();
        table.start().unwrap();

        store.save(&table).await.unwrap();
        assert!(dir.join("front-nine.json").exists());
        assert!(!dir.join("front-nine.json.tmp").exists());

        let loaded = store.load(&table.name).await.unwrap().unwrap();
        assert_eq!(loaded, table);

        fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_record() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("bad.json"), b"{not json").await.unwrap();

        let store = JsonFileStore::new(&dir);
        let err = store.load(&TableName::parse("bad").unwrap()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
