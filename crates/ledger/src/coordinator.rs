// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    AbandonDecryption, BeginDecryption, DecryptionPolicy, FinalizeRecord, GetPendingDecryptions,
    Ledger, MetricsError, MetricsResult, PrepareDecryption, RequestTable,
};
use actix::prelude::*;
use adm_data::{AutoPersist, Persistable, Repository};
use adm_events::{
    Address, AdmErrorType, AdmEvent, CallbackSelector, DecryptionRequested, ErrorEvent, EventBus,
    RecordId, RequestId,
};
use adm_oracle::{Counters, DecryptionOracle, DecryptionResponse};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ask the oracle to reveal a record
#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "MetricsResult<RequestId>")]
pub struct RequestDecryption {
    pub record_id: RecordId,
    pub requester: Address,
}

/// Oracle callback carrying ABI encoded counters and a proof over them
#[derive(Message, Clone, Debug)]
#[rtype(result = "MetricsResult<RecordId>")]
pub struct DecryptionCallback {
    pub request_id: RequestId,
    pub cleartexts: Vec<u8>,
    pub proof: Vec<u8>,
}

impl From<DecryptionResponse> for DecryptionCallback {
    fn from(value: DecryptionResponse) -> Self {
        Self {
            request_id: value.request_id,
            cleartexts: value.cleartexts.extract_bytes(),
            proof: value.proof.extract_bytes(),
        }
    }
}

#[derive(Message, Clone, Copy, Debug)]
#[rtype(result = "Option<RecordId>")]
pub struct GetPendingRequest(pub RequestId);

/// Binds oracle request ids to records and gates every callback before it reaches the ledger.
pub struct DecryptionCoordinator {
    requests: Persistable<RequestTable>,
    ledger: Addr<Ledger>,
    oracle: Arc<dyn DecryptionOracle>,
    policy: Arc<dyn DecryptionPolicy>,
    bus: Addr<EventBus<AdmEvent>>,
}

impl DecryptionCoordinator {
    pub fn new(
        requests: Persistable<RequestTable>,
        ledger: Addr<Ledger>,
        oracle: Arc<dyn DecryptionOracle>,
        policy: Arc<dyn DecryptionPolicy>,
        bus: Addr<EventBus<AdmEvent>>,
    ) -> Self {
        Self {
            requests,
            ledger,
            oracle,
            policy,
            bus,
        }
    }

    /// Load the request table and start the actor.
    ///
    /// The ledger's pending statuses are authoritative: rows without a pending record are
    /// dropped and pending records without a row get one back.
    pub async fn attach(
        bus: &Addr<EventBus<AdmEvent>>,
        repository: &Repository<RequestTable>,
        ledger: Addr<Ledger>,
        oracle: Arc<dyn DecryptionOracle>,
        policy: Arc<dyn DecryptionPolicy>,
    ) -> Result<Addr<Self>> {
        let mut requests = repository.load_or_default(RequestTable::new()).await?;
        let expected: RequestTable = ledger
            .send(GetPendingDecryptions)
            .await?
            .into_iter()
            .map(|(record_id, request_id)| (request_id, record_id))
            .collect();

        if requests.get().as_ref() != Some(&expected) {
            warn!(
                "Request table out of step with ledger, restoring {} pending requests",
                expected.len()
            );
            requests.set(expected);
        }

        let pending = requests.try_with(|rows| Ok(rows.len()))?;
        let addr = DecryptionCoordinator::new(requests, ledger, oracle, policy, bus.clone()).start();
        info!("DecryptionCoordinator started with {pending} pending requests");
        Ok(addr)
    }

    fn lookup(&self, request_id: &RequestId) -> MetricsResult<Option<RecordId>> {
        self.requests
            .try_with(|rows| Ok(rows.get(request_id).copied()))
            .map_err(MetricsError::from_anyhow)
    }

    fn insert_request(&mut self, request_id: RequestId, record_id: RecordId) -> MetricsResult<()> {
        self.requests
            .try_mutate(|mut rows| {
                rows.insert(request_id, record_id);
                Ok(rows)
            })
            .map_err(MetricsError::from_anyhow)
    }

    fn remove_request(&mut self, request_id: &RequestId) -> MetricsResult<()> {
        self.requests
            .try_mutate(|mut rows| {
                rows.remove(request_id);
                Ok(rows)
            })
            .map_err(MetricsError::from_anyhow)
    }

    fn verify(&self, request_id: &RequestId, cleartexts: &[u8], proof: &[u8]) -> MetricsResult<()> {
        let reason = match self.oracle.verify_proof(request_id, cleartexts, proof) {
            Ok(true) => return Ok(()),
            Ok(false) => anyhow!("Proof for {request_id} was rejected"),
            Err(err) => err.context(format!("Proof for {request_id} could not be checked")),
        };

        error!("{reason:#}");
        self.bus
            .do_send(AdmEvent::from_error(AdmErrorType::Security, reason));
        Err(MetricsError::InvalidProof(*request_id))
    }
}

impl Actor for DecryptionCoordinator {
    type Context = Context<Self>;
}

async fn open_request(
    ledger: Addr<Ledger>,
    oracle: Arc<dyn DecryptionOracle>,
    policy: Arc<dyn DecryptionPolicy>,
    record_id: RecordId,
    requester: Address,
) -> MetricsResult<RequestId> {
    let record = ledger.send(PrepareDecryption(record_id)).await??;
    if !policy.may_request(&requester, record_id, &record) {
        return Err(MetricsError::Unauthorized {
            record_id,
            requester,
        });
    }

    let request_id = oracle
        .request_decryption(record.handles(), CallbackSelector::decryption_callback())
        .await
        .map_err(MetricsError::Capability)?;

    ledger
        .send(BeginDecryption::new(record_id, request_id))
        .await??;
    Ok(request_id)
}

async fn finalize(ledger: Addr<Ledger>, record_id: RecordId, counters: Counters) -> MetricsResult<()> {
    ledger.send(FinalizeRecord::new(record_id, counters)).await?
}

async fn abandon(
    ledger: Addr<Ledger>,
    record_id: RecordId,
    request_id: RequestId,
    reason: String,
) -> MetricsResult<bool> {
    ledger
        .send(AbandonDecryption::new(record_id, request_id, reason))
        .await?
}

impl Handler<RequestDecryption> for DecryptionCoordinator {
    type Result = AtomicResponse<Self, MetricsResult<RequestId>>;

    fn handle(&mut self, msg: RequestDecryption, _: &mut Self::Context) -> Self::Result {
        let RequestDecryption {
            record_id,
            requester,
        } = msg;

        AtomicResponse::new(Box::pin(
            open_request(
                self.ledger.clone(),
                self.oracle.clone(),
                self.policy.clone(),
                record_id,
                requester,
            )
            .into_actor(self)
            .map(move |res, act, _| {
                let request_id = res?;
                if let Err(err) = act.insert_request(request_id, record_id) {
                    error!("Could not store {request_id} for {record_id}: {err}");
                    act.ledger.do_send(AbandonDecryption::new(
                        record_id,
                        request_id,
                        err.to_string(),
                    ));
                    return Err(err);
                }

                info!("Decryption of {record_id} requested by {requester} as {request_id}");
                act.bus.do_send(AdmEvent::from(DecryptionRequested {
                    record_id,
                    request_id,
                    requester,
                }));
                Ok(request_id)
            }),
        ))
    }
}

impl Handler<DecryptionCallback> for DecryptionCoordinator {
    type Result = AtomicResponse<Self, MetricsResult<RecordId>>;

    fn handle(&mut self, msg: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        let DecryptionCallback {
            request_id,
            cleartexts,
            proof,
        } = msg;

        let record_id = match self.lookup(&request_id) {
            Ok(Some(record_id)) => record_id,
            Ok(None) => {
                warn!("Callback for unknown or consumed request {request_id}");
                return AtomicResponse::new(Box::pin(fut::ready(Err(
                    MetricsError::InvalidRequest(request_id),
                ))));
            }
            Err(err) => return AtomicResponse::new(Box::pin(fut::ready(Err(err)))),
        };

        if let Err(err) = self.verify(&request_id, &cleartexts, &proof) {
            return AtomicResponse::new(Box::pin(fut::ready(Err(err))));
        }

        let counters = match Counters::from_abi(&cleartexts) {
            Ok(counters) => counters,
            Err(err) => {
                let reason = format!("{err:#}");
                warn!("Malformed cleartext for {request_id}: {reason}");
                if let Err(err) = self.remove_request(&request_id) {
                    return AtomicResponse::new(Box::pin(fut::ready(Err(err))));
                }
                return AtomicResponse::new(Box::pin(
                    abandon(self.ledger.clone(), record_id, request_id, reason.clone())
                        .into_actor(self)
                        .map(move |res, _, _| {
                            if let Err(err) = res {
                                error!("Could not reset {record_id}: {err}");
                            }
                            Err(MetricsError::MalformedCleartext { request_id, reason })
                        }),
                ));
            }
        };

        AtomicResponse::new(Box::pin(
            finalize(self.ledger.clone(), record_id, counters)
                .into_actor(self)
                .map(move |res, act, _| match res {
                    Ok(()) => {
                        act.remove_request(&request_id)?;
                        info!("{request_id} fulfilled, {record_id} revealed as {counters}");
                        Ok(record_id)
                    }
                    Err(MetricsError::AlreadyRevealed(id)) => {
                        warn!("{request_id} arrived for already revealed {id}");
                        act.remove_request(&request_id)?;
                        Err(MetricsError::AlreadyRevealed(id))
                    }
                    Err(err) => {
                        error!("Could not finalize {record_id} for {request_id}: {err}");
                        Err(err)
                    }
                }),
        ))
    }
}

impl Handler<GetPendingRequest> for DecryptionCoordinator {
    type Result = Option<RecordId>;

    fn handle(&mut self, msg: GetPendingRequest, _: &mut Self::Context) -> Self::Result {
        self.lookup(&msg.0).ok().flatten()
    }
}
