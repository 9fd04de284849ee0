// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerState;
use adm_config::StoreKeys;
use adm_data::{Repositories, Repository};
use adm_events::{RecordId, RequestId};
use std::collections::BTreeMap;

/// Pending decryption requests waiting for their callback
pub type RequestTable = BTreeMap<RequestId, RecordId>;

pub trait LedgerRepositoryFactory {
    fn ledger(&self) -> Repository<LedgerState>;
    fn decryption_requests(&self) -> Repository<RequestTable>;
}

impl LedgerRepositoryFactory for Repositories {
    fn ledger(&self) -> Repository<LedgerState> {
        Repository::new(self.store.base(StoreKeys::ledger()))
    }

    fn decryption_requests(&self) -> Repository<RequestTable> {
        Repository::new(self.store.base(StoreKeys::decryption_requests()))
    }
}
