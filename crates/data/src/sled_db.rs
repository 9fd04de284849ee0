// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use sled::Tree;
use std::path::Path;

use crate::{
    sled_utils::{clear_all_caches, get_or_open_db_tree},
    Get, Insert, KeyValStore, Remove,
};

/// A single named tree within a process-wide cached sled database.
pub struct SledDb {
    db: Tree,
}

impl SledDb {
    pub fn new(path: &Path, tree: &str) -> Result<Self> {
        let db = get_or_open_db_tree(path, tree)?;
        Ok(Self { db })
    }

    pub fn close_all_connections() {
        clear_all_caches()
    }
}

impl KeyValStore for SledDb {
    fn insert(&mut self, msg: Insert) -> Result<()> {
        self.db
            .insert(msg.key(), msg.value().to_vec())
            .context("Could not insert data into db")?;
        Ok(())
    }

    fn remove(&mut self, msg: Remove) -> Result<()> {
        self.db
            .remove(msg.key())
            .context("Could not remove data from db")?;
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        let key = msg.key();
        let res = self
            .db
            .get(key)
            .with_context(|| format!("Failed to fetch {}", String::from_utf8_lossy(key)))?;

        Ok(res.map(|v| v.to_vec()))
    }

    fn flush(&self) -> Result<()> {
        self.db.flush().context("Could not flush db")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_instances_share_cached_db() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("ledger.db");

        let mut db1 = SledDb::new(&db_path, "datastore")?;
        db1.insert(Insert::new("//ledger", b"state".to_vec()))?;

        let mut db2 = SledDb::new(&db_path, "datastore")?;
        assert_eq!(db2.get(Get::new("//ledger"))?, Some(b"state".to_vec()));

        db2.remove(Remove::new("//ledger"))?;
        assert_eq!(db1.get(Get::new("//ledger"))?, None);

        let other = SledDb::new(&temp_dir.path().join("other.db"), "datastore")?;
        db1.insert(Insert::new("//decryption_requests", b"rows".to_vec()))?;
        assert_eq!(other.get(Get::new("//decryption_requests"))?, None);
        Ok(())
    }
}
