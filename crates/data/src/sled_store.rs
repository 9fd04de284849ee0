// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, InsertSync, KeyValStore, Remove, SledDb};
use actix::{Actor, ActorContext, Addr, Handler};
use adm_events::{AdmErrorType, AdmEvent, ErrorEvent, EventBus, Subscribe};
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::{error, info};

/// Actor fronting a [`SledDb`]. Write failures are reported on the bus as data errors and the
/// database handle is dropped when a `Shutdown` event arrives.
pub struct SledStore {
    db: Option<SledDb>,
    bus: Addr<EventBus<AdmEvent>>,
}

impl Actor for SledStore {
    type Context = actix::Context<Self>;
}

impl SledStore {
    pub fn new(bus: &Addr<EventBus<AdmEvent>>, path: &Path) -> Result<Addr<Self>> {
        info!("Starting SledStore with {:?}", path);
        let db = SledDb::new(path, "datastore")?;

        let store = Self {
            db: Some(db),
            bus: bus.clone(),
        }
        .start();

        bus.do_send(Subscribe::new("Shutdown", store.clone().recipient()));

        Ok(store)
    }

    fn report(&self, err: anyhow::Error) {
        error!("{err}");
        self.bus.do_send(AdmEvent::from_error(AdmErrorType::Data, err));
    }
}

impl Handler<Insert> for SledStore {
    type Result = ();

    fn handle(&mut self, event: Insert, _: &mut Self::Context) -> Self::Result {
        let Some(db) = self.db.as_mut() else {
            return;
        };
        if let Err(err) = db.insert(event) {
            self.report(err);
        }
    }
}

impl Handler<InsertSync> for SledStore {
    type Result = Result<()>;

    fn handle(&mut self, event: InsertSync, _: &mut Self::Context) -> Self::Result {
        let db = self
            .db
            .as_mut()
            .ok_or_else(|| anyhow!("Attempt to write to dropped db"))?;
        db.insert(event.into())?;
        db.flush()
    }
}

impl Handler<Remove> for SledStore {
    type Result = ();

    fn handle(&mut self, event: Remove, _: &mut Self::Context) -> Self::Result {
        let Some(db) = self.db.as_mut() else {
            return;
        };
        if let Err(err) = db.remove(event) {
            self.report(err);
        }
    }
}

impl Handler<Get> for SledStore {
    type Result = Option<Vec<u8>>;

    fn handle(&mut self, event: Get, _: &mut Self::Context) -> Self::Result {
        let Some(db) = self.db.as_ref() else {
            error!("Attempt to get data from dropped db");
            return None;
        };
        match db.get(event) {
            Ok(v) => v,
            Err(err) => {
                self.report(err);
                None
            }
        }
    }
}

impl Handler<AdmEvent> for SledStore {
    type Result = ();
    fn handle(&mut self, msg: AdmEvent, ctx: &mut Self::Context) -> Self::Result {
        if let AdmEvent::Shutdown { .. } = msg {
            let _db = self.db.take();
            ctx.stop()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataStore;
    use adm_events::{EventBusConfig, Shutdown};
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::sleep;

    #[actix::test]
    async fn test_sled_store_data_outlives_the_actor() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("adm.db");
        let bus = EventBus::<AdmEvent>::new(EventBusConfig { deduplicate: true }).start();

        let addr = SledStore::new(&bus, &path)?;
        let store = DataStore::from(&addr).base("//ledger");
        store.write_sync(vec![3u32, 4, 5]).await?;
        assert_eq!(store.read::<Vec<u32>>().await?, Some(vec![3, 4, 5]));

        bus.send(AdmEvent::from(Shutdown)).await?;
        sleep(Duration::from_millis(10)).await;
        assert!(!addr.connected());

        let reopened = SledStore::new(&bus, &path)?;
        let store = DataStore::from(&reopened).base("//ledger");
        assert_eq!(store.read::<Vec<u32>>().await?, Some(vec![3, 4, 5]));
        Ok(())
    }
}
