// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::{CallbackSelector, CiphertextHandle, RequestId};
use adm_oracle::{
    sign_decryption, verify_decryption_proof, Counters, DecryptionOracle, DecryptionResponse,
};
use adm_utils::ArcBytes;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Mutex,
};

/// A decryption request as the oracle received it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub request_id: RequestId,
    pub handles: Vec<CiphertextHandle>,
    pub selector: CallbackSelector,
}

/// Oracle that records requests and signs whatever cleartexts a test hands it.
///
/// With `set_bad_proof(true)` responses are signed by a key the oracle does not trust.
#[derive(Debug)]
pub struct MockOracle {
    signer: PrivateKeySigner,
    rogue: PrivateKeySigner,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: AtomicU64,
    bad_proof: AtomicBool,
    unavailable: AtomicBool,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
            rogue: PrivateKeySigner::random(),
            requests: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            bad_proof: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn requests(&self) -> Result<Vec<RecordedRequest>> {
        Ok(self
            .requests
            .lock()
            .map_err(|e| anyhow!("{e}"))?
            .clone())
    }

    pub fn set_bad_proof(&self, bad: bool) {
        self.bad_proof.store(bad, Ordering::SeqCst);
    }

    /// Refuse new requests until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Sign arbitrary cleartexts for a request
    pub fn sign(&self, request_id: &RequestId, cleartexts: &[u8]) -> Result<Vec<u8>> {
        let signer = if self.bad_proof.load(Ordering::SeqCst) {
            &self.rogue
        } else {
            &self.signer
        };
        sign_decryption(signer, request_id, cleartexts)
    }

    /// Build the callback payload for `counters`
    pub fn respond(&self, request_id: &RequestId, counters: Counters) -> Result<DecryptionResponse> {
        let cleartexts = counters.to_abi();
        let proof = self.sign(request_id, &cleartexts)?;
        Ok(DecryptionResponse {
            request_id: *request_id,
            cleartexts: ArcBytes::from_bytes(cleartexts),
            proof: ArcBytes::from_bytes(proof),
        })
    }

    fn next_request_id(&self) -> RequestId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 32];
        bytes[0] = 0x0a;
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        RequestId(bytes)
    }
}

#[async_trait]
impl DecryptionOracle for MockOracle {
    async fn request_decryption(
        &self,
        handles: Vec<CiphertextHandle>,
        selector: CallbackSelector,
    ) -> Result<RequestId> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("Mock oracle unavailable");
        }
        let request_id = self.next_request_id();
        self.requests
            .lock()
            .map_err(|e| anyhow!("{e}"))?
            .push(RecordedRequest {
                request_id,
                handles,
                selector,
            });
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: &RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<bool> {
        verify_decryption_proof(&self.signer.address(), request_id, cleartexts, proof)
    }

    fn signer(&self) -> Option<Address> {
        Some(self.signer.address())
    }
}
