// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, InsertSync, Remove};
use actix::{Actor, Handler, Message};
use anyhow::Result;
use std::collections::BTreeMap;

/// Returns every write applied to a capturing [`InMemStore`], oldest first.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash)]
#[rtype(result = "Vec<DataOp>")]
pub struct GetLog;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataOp {
    Insert(Insert),
    Remove(Remove),
}

/// Volatile store used by tests and by nodes started without a database path.
pub struct InMemStore {
    db: BTreeMap<Vec<u8>, Vec<u8>>,
    log: Option<Vec<DataOp>>,
}

impl Actor for InMemStore {
    type Context = actix::Context<Self>;
}

impl InMemStore {
    pub fn new(capture: bool) -> Self {
        Self {
            db: BTreeMap::new(),
            log: capture.then(Vec::new),
        }
    }

    fn record(&mut self, op: DataOp) {
        if let Some(log) = self.log.as_mut() {
            log.push(op);
        }
    }

    fn put(&mut self, msg: Insert) {
        self.db.insert(msg.key().to_vec(), msg.value().to_vec());
        self.record(DataOp::Insert(msg));
    }
}

impl Handler<Insert> for InMemStore {
    type Result = ();
    fn handle(&mut self, msg: Insert, _: &mut Self::Context) {
        self.put(msg);
    }
}

impl Handler<InsertSync> for InMemStore {
    type Result = Result<()>;
    fn handle(&mut self, msg: InsertSync, _: &mut Self::Context) -> Self::Result {
        self.put(msg.into());
        Ok(())
    }
}

impl Handler<Remove> for InMemStore {
    type Result = ();
    fn handle(&mut self, msg: Remove, _: &mut Self::Context) {
        self.db.remove(msg.key());
        self.record(DataOp::Remove(msg));
    }
}

impl Handler<Get> for InMemStore {
    type Result = Option<Vec<u8>>;
    fn handle(&mut self, msg: Get, _: &mut Self::Context) -> Self::Result {
        self.db.get(msg.key()).cloned()
    }
}

impl Handler<GetLog> for InMemStore {
    type Result = Vec<DataOp>;
    fn handle(&mut self, _: GetLog, _: &mut Self::Context) -> Self::Result {
        self.log.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataStore;

    #[actix::test]
    async fn test_capture_records_writes_in_order() -> Result<()> {
        let addr = InMemStore::new(true).start();
        let store = DataStore::from(&addr).base("//ledger");
        store.write(42u64);
        store.clear();
        assert_eq!(store.read::<u64>().await?, None);

        let log = addr.send(GetLog).await?;
        assert_eq!(log.len(), 2);
        assert!(matches!(log[0], DataOp::Insert(_)));
        assert!(matches!(log[1], DataOp::Remove(_)));
        Ok(())
    }

    #[actix::test]
    async fn test_no_capture_keeps_log_empty() -> Result<()> {
        let addr = InMemStore::new(false).start();
        DataStore::from(&addr).base("//ledger").write_sync(1u64).await?;
        assert!(addr.send(GetLog).await?.is_empty());
        Ok(())
    }
}
