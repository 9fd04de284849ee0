// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{MetricsError, MetricsResult};
use adm_events::{Address, CiphertextHandle, RecordId, RequestId};
use adm_oracle::Counters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encrypted counters as submitted. Never changes after submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    pub impressions: CiphertextHandle,
    pub clicks: CiphertextHandle,
    pub conversions: CiphertextHandle,
    pub submitter: Address,
    /// Unix seconds
    pub created_at: u64,
}

impl EncryptedRecord {
    /// Handles in cleartext wire order
    pub fn handles(&self) -> Vec<CiphertextHandle> {
        vec![self.impressions, self.clicks, self.conversions]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedResult {
    pub impressions: u32,
    pub clicks: u32,
    pub conversions: u32,
    pub revealed: bool,
}

impl DecryptedResult {
    pub fn revealed(counters: Counters) -> Self {
        Self {
            impressions: counters.impressions,
            clicks: counters.clicks,
            conversions: counters.conversions,
            revealed: true,
        }
    }

    pub fn counters(&self) -> Counters {
        Counters::new(self.impressions, self.clicks, self.conversions)
    }
}

/// Decryption lifecycle of a record. `Revealed` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecryptionStatus {
    #[default]
    Encrypted,
    Pending(RequestId),
    Revealed,
}

impl fmt::Display for DecryptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptionStatus::Encrypted => write!(f, "Encrypted"),
            DecryptionStatus::Pending(request_id) => write!(f, "Pending({request_id})"),
            DecryptionStatus::Revealed => write!(f, "Revealed"),
        }
    }
}

/// The ledger tables. Row `i` of each table belongs to `RecordId(i + 1)`; rows are only ever
/// appended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    records: Vec<EncryptedRecord>,
    results: Vec<DecryptedResult>,
    status: Vec<DecryptionStatus>,
}

impl LedgerState {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record together with its zeroed result row
    pub fn submit(&mut self, record: EncryptedRecord) -> MetricsResult<RecordId> {
        let record_id =
            RecordId::from_index(self.records.len()).ok_or(MetricsError::RecordIdsExhausted)?;
        self.records.push(record);
        self.results.push(DecryptedResult::default());
        self.status.push(DecryptionStatus::Encrypted);
        Ok(record_id)
    }

    pub fn record(&self, record_id: RecordId) -> Option<&EncryptedRecord> {
        record_id.index().and_then(|i| self.records.get(i))
    }

    /// Zeroed and unrevealed for unknown records
    pub fn result(&self, record_id: RecordId) -> DecryptedResult {
        record_id
            .index()
            .and_then(|i| self.results.get(i))
            .copied()
            .unwrap_or_default()
    }

    pub fn status(&self, record_id: RecordId) -> Option<DecryptionStatus> {
        record_id.index().and_then(|i| self.status.get(i)).copied()
    }

    /// Records currently waiting on the oracle
    pub fn pending(&self) -> Vec<(RecordId, RequestId)> {
        self.status
            .iter()
            .enumerate()
            .filter_map(|(i, status)| match status {
                DecryptionStatus::Pending(request_id) => {
                    RecordId::from_index(i).map(|id| (id, *request_id))
                }
                _ => None,
            })
            .collect()
    }

    /// A decryption may be requested only for an existing record that is neither revealed nor
    /// already pending.
    pub fn check_requestable(&self, record_id: RecordId) -> MetricsResult<&EncryptedRecord> {
        let record = self
            .record(record_id)
            .ok_or(MetricsError::UnknownRecord(record_id))?;
        match self.status(record_id) {
            Some(DecryptionStatus::Encrypted) => Ok(record),
            Some(DecryptionStatus::Pending(request_id)) => Err(
                MetricsError::RequestAlreadyPending(record_id, request_id),
            ),
            Some(DecryptionStatus::Revealed) => Err(MetricsError::AlreadyRevealed(record_id)),
            None => Err(MetricsError::UnknownRecord(record_id)),
        }
    }

    /// `Encrypted -> Pending(request_id)`
    pub fn begin(&mut self, record_id: RecordId, request_id: RequestId) -> MetricsResult<()> {
        self.check_requestable(record_id)?;
        self.set_status(record_id, DecryptionStatus::Pending(request_id))
    }

    /// Store the cleartext counters and mark the record revealed. Succeeds exactly once per
    /// record.
    pub fn finalize(&mut self, record_id: RecordId, counters: Counters) -> MetricsResult<()> {
        let index = record_id
            .index()
            .filter(|i| *i < self.records.len())
            .ok_or(MetricsError::UnknownRecord(record_id))?;

        if self.status[index] == DecryptionStatus::Revealed || self.results[index].revealed {
            return Err(MetricsError::AlreadyRevealed(record_id));
        }

        self.results[index] = DecryptedResult::revealed(counters);
        self.status[index] = DecryptionStatus::Revealed;
        Ok(())
    }

    /// `Pending(request_id) -> Encrypted`. Returns false when the record is not waiting on
    /// this request.
    pub fn abandon(&mut self, record_id: RecordId, request_id: RequestId) -> MetricsResult<bool> {
        match self.status(record_id) {
            Some(DecryptionStatus::Pending(pending)) if pending == request_id => {
                self.set_status(record_id, DecryptionStatus::Encrypted)?;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(MetricsError::UnknownRecord(record_id)),
        }
    }

    fn set_status(&mut self, record_id: RecordId, status: DecryptionStatus) -> MetricsResult<()> {
        let slot = record_id
            .index()
            .and_then(|i| self.status.get_mut(i))
            .ok_or(MetricsError::UnknownRecord(record_id))?;
        *slot = status;
        Ok(())
    }
}
