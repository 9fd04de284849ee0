// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Addr;
use adm_data::DataStore;
use adm_events::{AdmEvent, EventBus, HistoryCollector, Shutdown};
use adm_ledger::{DecryptionCoordinator, Ledger};
use anyhow::{anyhow, Result};

/// Running instance: the actors plus the bus and store they share
#[derive(Clone, Debug)]
pub struct AdMetricsHandle {
    pub bus: Addr<EventBus<AdmEvent>>,
    pub ledger: Addr<Ledger>,
    pub coordinator: Addr<DecryptionCoordinator>,
    pub store: DataStore,
    pub history: Option<Addr<HistoryCollector<AdmEvent>>>,
}

impl AdMetricsHandle {
    pub fn history(&self) -> Result<Addr<HistoryCollector<AdmEvent>>> {
        self.history
            .clone()
            .ok_or_else(|| anyhow!("No history collector. Build with testmode_with_history()"))
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Ask every subscribed actor to stop. Sled stores flush and release their handle.
    pub fn shutdown(&self) {
        self.bus.do_send(AdmEvent::from(Shutdown));
    }
}
