// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::borrow::Cow;

use crate::{Get, InMemStore, Insert, InsertSync, IntoKey, Remove, SledStore};
use actix::{Actor, Addr, Handler, Recipient};
use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

/// Scoped handle onto a key value store actor.
///
/// Every handle addresses a single key. Persisted state lives under keys such as
/// `//ledger` and `//decryption_requests`, derived with [`DataStore::base`] and
/// [`DataStore::scope`].
#[derive(Clone, Debug)]
pub struct DataStore {
    scope: Vec<u8>,
    get: Recipient<Get>,
    insert: Recipient<Insert>,
    insert_sync: Recipient<InsertSync>,
    remove: Recipient<Remove>,
}

impl DataStore {
    fn connect<A>(addr: &Addr<A>) -> Self
    where
        A: Actor<Context = actix::Context<A>>
            + Handler<Get>
            + Handler<Insert>
            + Handler<InsertSync>
            + Handler<Remove>,
    {
        Self {
            scope: Vec::new(),
            get: addr.clone().recipient(),
            insert: addr.clone().recipient(),
            insert_sync: addr.clone().recipient(),
            remove: addr.clone().recipient(),
        }
    }

    /// Fetch and decode the value under this key. A missing key yields `None`.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.get.send(Get::new(&self.scope)).await? {
            // A lone zero byte is what a unit value encodes to
            None => Ok(None),
            Some(bytes) if bytes == [0] => Ok(None),
            Some(bytes) => bincode::deserialize(&bytes)
                .map(Some)
                .with_context(|| format!("Could not decode value at {}", self.get_scope())),
        }
    }

    /// Queue a write without waiting for the store to apply it.
    pub fn write<T: Serialize>(&self, value: T) {
        match bincode::serialize(&value) {
            Ok(bytes) => self.insert.do_send(Insert::new(&self.scope, bytes)),
            Err(err) => error!(key = %self.get_scope(), "Could not encode value: {err}"),
        }
    }

    /// Write and wait until the store confirms.
    pub async fn write_sync<T: Serialize>(&self, value: T) -> Result<()> {
        let bytes = bincode::serialize(&value)
            .map_err(|err| anyhow!("Could not encode value at {}: {err}", self.get_scope()))?;
        self.insert_sync
            .send(InsertSync::new(&self.scope, bytes))
            .await??;
        Ok(())
    }

    pub fn clear(&self) {
        self.remove.do_send(Remove::new(&self.scope))
    }

    pub fn get_scope(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.scope)
    }

    /// Append a path segment to the current key, inserting a separator when the
    /// segment lacks one.
    /// ```
    /// use adm_data::{DataStore, InMemStore};
    /// use actix::Actor;
    ///
    /// #[actix::main]
    /// async fn main() {
    ///   let store = DataStore::from(&InMemStore::new(false).start());
    ///   let key = store.base("//records").scope("7").scope("/status");
    ///   assert_eq!(key.get_scope(), "//records/7/status");
    /// }
    /// ```
    pub fn scope<K: IntoKey>(&self, key: K) -> Self {
        let segment = key.into_key();
        let mut scope = self.scope.clone();
        if segment.first() != Some(&b'/') {
            scope.push(b'/');
        }
        scope.extend(segment);
        Self {
            scope,
            ..self.clone()
        }
    }

    /// Same backing store, rooted at `key`.
    pub fn base<K: IntoKey>(&self, key: K) -> Self {
        Self {
            scope: key.into_key(),
            ..self.clone()
        }
    }
}

impl From<&Addr<SledStore>> for DataStore {
    fn from(addr: &Addr<SledStore>) -> Self {
        Self::connect(addr)
    }
}

impl From<&Addr<InMemStore>> for DataStore {
    fn from(addr: &Addr<InMemStore>) -> Self {
        Self::connect(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::Actor;

    #[actix::test]
    async fn test_scoped_reads_and_writes() -> Result<()> {
        let addr = InMemStore::new(false).start();
        let store = DataStore::from(&addr);
        let ledger = store.base("//ledger");
        let requests = store.base("//decryption_requests");

        ledger.write(vec![1u64, 2, 3]);
        requests.write_sync(String::from("pending")).await?;

        assert_eq!(ledger.read::<Vec<u64>>().await?, Some(vec![1, 2, 3]));
        assert_eq!(requests.read::<String>().await?, Some("pending".to_string()));
        assert_eq!(store.base("//missing").read::<String>().await?, None);

        ledger.clear();
        assert_eq!(ledger.read::<Vec<u64>>().await?, None);
        Ok(())
    }
}
