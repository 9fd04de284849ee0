// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub struct StoreKeys;

impl StoreKeys {
    /// Encrypted records, decrypted results and per-record decryption status
    pub fn ledger() -> String {
        String::from("//ledger")
    }

    /// Pending `RequestId -> RecordId` rows
    pub fn decryption_requests() -> String {
        String::from("//decryption_requests")
    }
}
