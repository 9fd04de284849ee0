// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr};
use adm_config::AppConfig;
use adm_data::{DataStore, InMemStore, SledDb, SledStore};
use adm_events::{AdmEvent, EventBus};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub fn get_sled_store(bus: &Addr<EventBus<AdmEvent>>, db_file: &Path) -> Result<DataStore> {
    Ok((&SledStore::new(bus, db_file)?).into())
}

pub fn get_in_mem_store(capture: bool) -> DataStore {
    (&InMemStore::new(capture).start()).into()
}

/// Store selected by `storage` in the config
pub fn setup_datastore(config: &AppConfig, bus: &Addr<EventBus<AdmEvent>>) -> Result<DataStore> {
    let store = if !config.use_in_mem_store() {
        let db_file = config.db_file()?;
        info!("Using sled store at {}", db_file.display());
        get_sled_store(bus, &db_file)?
    } else {
        get_in_mem_store(false)
    };
    Ok(store)
}

pub fn close_all_connections() {
    SledDb::close_all_connections();
}
