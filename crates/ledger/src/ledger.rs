// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    DecryptedResult, DecryptionStatus, EncryptedRecord, LedgerState, MetricsError, MetricsResult,
};
use actix::prelude::*;
use adm_data::{AutoPersist, Persistable, Repository};
use adm_events::{
    Address, AdmEvent, CiphertextHandle, DecryptionReset, EventBus, RecordDecrypted, RecordId,
    RecordSubmitted, RequestId,
};
use adm_fhe::CiphertextOps;
use adm_oracle::Counters;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, trace, warn};

#[derive(Message, Clone, Debug)]
#[rtype(result = "MetricsResult<RecordId>")]
pub struct SubmitRecord {
    pub impressions: CiphertextHandle,
    pub clicks: CiphertextHandle,
    pub conversions: CiphertextHandle,
    pub submitter: Address,
}

/// Decrypted counters of a record. Zeroed and unrevealed for unknown ids.
#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "DecryptedResult")]
pub struct GetResult(pub RecordId);

#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "Option<EncryptedRecord>")]
pub struct GetRecord(pub RecordId);

#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "Option<DecryptionStatus>")]
pub struct GetDecryptionStatus(pub RecordId);

#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "u64")]
pub struct GetRecordCount;

#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "Vec<(RecordId, RequestId)>")]
pub struct GetPendingDecryptions;

/// Channel-wise homomorphic sum over the listed records, in input order
#[derive(Message, Clone, Debug)]
#[rtype(result = "MetricsResult<EncryptedTotals>")]
pub struct AggregateRecords(pub Vec<RecordId>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptedTotals {
    pub impressions: CiphertextHandle,
    pub clicks: CiphertextHandle,
    pub conversions: CiphertextHandle,
}

/// Read-only check that a decryption may be requested. Returns the record.
#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "MetricsResult<EncryptedRecord>")]
pub struct PrepareDecryption(pub RecordId);

/// `Encrypted -> Pending`. Only the coordinator builds this.
#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "MetricsResult<()>")]
pub struct BeginDecryption {
    record_id: RecordId,
    request_id: RequestId,
}

impl BeginDecryption {
    pub(crate) fn new(record_id: RecordId, request_id: RequestId) -> Self {
        Self {
            record_id,
            request_id,
        }
    }
}

/// Reveal a record. Only the coordinator builds this.
#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "MetricsResult<()>")]
pub struct FinalizeRecord {
    record_id: RecordId,
    counters: Counters,
}

impl FinalizeRecord {
    pub(crate) fn new(record_id: RecordId, counters: Counters) -> Self {
        Self {
            record_id,
            counters,
        }
    }
}

/// `Pending -> Encrypted` after a terminal callback failure. Only the coordinator builds this.
#[derive(Message, Clone, Debug)]
#[rtype(result = "MetricsResult<bool>")]
pub struct AbandonDecryption {
    record_id: RecordId,
    request_id: RequestId,
    reason: String,
}

impl AbandonDecryption {
    pub(crate) fn new(record_id: RecordId, request_id: RequestId, reason: impl Into<String>) -> Self {
        Self {
            record_id,
            request_id,
            reason: reason.into(),
        }
    }
}

/// Owner of the encrypted records and their decrypted results.
///
/// All reads and writes go through the actor mailbox so every operation observes and leaves a
/// consistent state. Mutations are applied to a copy of the state and persisted only when they
/// succeed.
pub struct Ledger {
    state: Persistable<LedgerState>,
    ciphertexts: Arc<dyn CiphertextOps>,
    bus: Addr<EventBus<AdmEvent>>,
}

impl Ledger {
    pub fn new(
        state: Persistable<LedgerState>,
        ciphertexts: Arc<dyn CiphertextOps>,
        bus: Addr<EventBus<AdmEvent>>,
    ) -> Self {
        Self {
            state,
            ciphertexts,
            bus,
        }
    }

    /// Load persisted tables (or start empty) and start the actor
    pub async fn attach(
        bus: &Addr<EventBus<AdmEvent>>,
        repository: &Repository<LedgerState>,
        ciphertexts: Arc<dyn CiphertextOps>,
    ) -> Result<Addr<Self>> {
        let state = repository.load_or_default(LedgerState::default()).await?;
        let records = state.try_with(|s| Ok(s.len()))?;
        let addr = Ledger::new(state, ciphertexts, bus.clone()).start();
        info!("Ledger started with {records} records");
        Ok(addr)
    }

    fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> MetricsResult<R> {
        self.state
            .try_with(|state| Ok(f(state)))
            .map_err(MetricsError::from_anyhow)
    }

    /// Run `f` against a copy of the state, keeping the copy only if `f` succeeds
    fn transition<R>(
        &mut self,
        f: impl FnOnce(&mut LedgerState) -> MetricsResult<R>,
    ) -> MetricsResult<R> {
        let mut output = None;
        self.state
            .try_mutate(|mut state| {
                output = Some(f(&mut state)?);
                Ok(state)
            })
            .map_err(MetricsError::from_anyhow)?;
        output.ok_or_else(|| MetricsError::Persistence(anyhow!("Ledger state was not applied")))
    }

    fn aggregate(&self, record_ids: &[RecordId]) -> MetricsResult<EncryptedTotals> {
        let records = self.read(|state| {
            record_ids
                .iter()
                .map(|id| {
                    state
                        .record(*id)
                        .cloned()
                        .ok_or(MetricsError::UnknownRecord(*id))
                })
                .collect::<MetricsResult<Vec<_>>>()
        })??;

        trace!("Aggregating {} records", records.len());
        let column = |pick: fn(&EncryptedRecord) -> CiphertextHandle| {
            let handles: Vec<_> = records.iter().map(pick).collect();
            self.ciphertexts
                .sum(&handles)
                .map_err(MetricsError::Capability)
        };
        let totals = EncryptedTotals {
            impressions: column(|r| r.impressions)?,
            clicks: column(|r| r.clicks)?,
            conversions: column(|r| r.conversions)?,
        };

        Ok(totals)
    }
}

impl Actor for Ledger {
    type Context = Context<Self>;
}

impl Handler<SubmitRecord> for Ledger {
    type Result = MetricsResult<RecordId>;

    fn handle(&mut self, msg: SubmitRecord, _: &mut Self::Context) -> Self::Result {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        let submitter = msg.submitter;
        let record_id = self.transition(|state| {
            state.submit(EncryptedRecord {
                impressions: msg.impressions,
                clicks: msg.clicks,
                conversions: msg.conversions,
                submitter,
                created_at: timestamp,
            })
        })?;

        info!("Submitted {record_id} from {submitter}");
        self.bus.do_send(AdmEvent::from(RecordSubmitted {
            record_id,
            submitter,
            timestamp,
        }));
        Ok(record_id)
    }
}

impl Handler<GetResult> for Ledger {
    type Result = MessageResult<GetResult>;

    fn handle(&mut self, msg: GetResult, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.read(|state| state.result(msg.0)).unwrap_or_default())
    }
}

impl Handler<GetRecord> for Ledger {
    type Result = Option<EncryptedRecord>;

    fn handle(&mut self, msg: GetRecord, _: &mut Self::Context) -> Self::Result {
        self.read(|state| state.record(msg.0).cloned())
            .ok()
            .flatten()
    }
}

impl Handler<GetDecryptionStatus> for Ledger {
    type Result = Option<DecryptionStatus>;

    fn handle(&mut self, msg: GetDecryptionStatus, _: &mut Self::Context) -> Self::Result {
        self.read(|state| state.status(msg.0)).ok().flatten()
    }
}

impl Handler<GetRecordCount> for Ledger {
    type Result = u64;

    fn handle(&mut self, _: GetRecordCount, _: &mut Self::Context) -> Self::Result {
        self.read(|state| state.len() as u64).unwrap_or_default()
    }
}

impl Handler<GetPendingDecryptions> for Ledger {
    type Result = MessageResult<GetPendingDecryptions>;

    fn handle(&mut self, _: GetPendingDecryptions, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.read(|state| state.pending()).unwrap_or_default())
    }
}

impl Handler<AggregateRecords> for Ledger {
    type Result = MetricsResult<EncryptedTotals>;

    fn handle(&mut self, msg: AggregateRecords, _: &mut Self::Context) -> Self::Result {
        self.aggregate(&msg.0)
    }
}

impl Handler<PrepareDecryption> for Ledger {
    type Result = MetricsResult<EncryptedRecord>;

    fn handle(&mut self, msg: PrepareDecryption, _: &mut Self::Context) -> Self::Result {
        self.read(|state| state.check_requestable(msg.0).cloned())?
    }
}

impl Handler<BeginDecryption> for Ledger {
    type Result = MetricsResult<()>;

    fn handle(&mut self, msg: BeginDecryption, _: &mut Self::Context) -> Self::Result {
        self.transition(|state| state.begin(msg.record_id, msg.request_id))?;
        info!("{} pending on {}", msg.record_id, msg.request_id);
        Ok(())
    }
}

impl Handler<FinalizeRecord> for Ledger {
    type Result = MetricsResult<()>;

    fn handle(&mut self, msg: FinalizeRecord, _: &mut Self::Context) -> Self::Result {
        let record_id = msg.record_id;
        self.transition(|state| state.finalize(record_id, msg.counters))?;

        info!("Revealed {record_id}");
        self.bus
            .do_send(AdmEvent::from(RecordDecrypted { record_id }));
        Ok(())
    }
}

impl Handler<AbandonDecryption> for Ledger {
    type Result = MetricsResult<bool>;

    fn handle(&mut self, msg: AbandonDecryption, _: &mut Self::Context) -> Self::Result {
        let AbandonDecryption {
            record_id,
            request_id,
            reason,
        } = msg;
        let reset = self.transition(|state| state.abandon(record_id, request_id))?;

        if reset {
            warn!("{record_id} reset to Encrypted after {request_id} failed: {reason}");
            self.bus.do_send(AdmEvent::from(DecryptionReset {
                record_id,
                request_id,
                reason,
            }));
        }
        Ok(reset)
    }
}
