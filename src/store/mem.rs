use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{
    Result, ShareLock,
    row::{FlowRow, RowKey},
    store::{RowStore, map_store_err},
};

/// In-memory row table.
#[derive(Debug, Clone, Default)]
pub struct MemRowStore {
    rows: ShareLock<BTreeMap<RowKey, FlowRow>>,
}

impl MemRowStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RowStore for MemRowStore {
    fn exists(
        &self,
        key: &RowKey,
    ) -> Result<bool> {
        let rows = self.rows.read().map_err(map_store_err)?;
        Ok(rows.contains_key(key))
    }

    fn find(
        &self,
        key: &RowKey,
    ) -> Result<Option<FlowRow>> {
        let rows = self.rows.read().map_err(map_store_err)?;
        Ok(rows.get(key).cloned())
    }

    fn list(
        &self,
        group: &str,
    ) -> Result<Vec<FlowRow>> {
        let rows = self.rows.read().map_err(map_store_err)?;
        Ok(rows.values().filter(|row| row.group == group).cloned().collect())
    }

    fn upsert(
        &self,
        row: &FlowRow,
    ) -> Result<bool> {
        trace!("mem::upsert({})", row.key());
        let mut rows = self.rows.write().map_err(map_store_err)?;
        Ok(rows.insert(row.key(), row.clone()).is_some())
    }

    fn delete(
        &self,
        key: &RowKey,
    ) -> Result<bool> {
        trace!("mem::delete({})", key);
        let mut rows = self.rows.write().map_err(map_store_err)?;
        Ok(rows.remove(key).is_some())
    }
}
