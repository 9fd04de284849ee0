// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::{CallbackSelector, CiphertextHandle, RequestId};
use alloy::primitives::Address;
use anyhow::Result;
use async_trait::async_trait;

/// External party that decrypts ciphertexts and later calls back with the cleartexts and a
/// proof of authenticity.
#[async_trait]
pub trait DecryptionOracle: Send + Sync {
    /// Ask for the ordered `handles` to be decrypted. The returned id is chosen by the oracle
    /// and identifies the eventual callback.
    async fn request_decryption(
        &self,
        handles: Vec<CiphertextHandle>,
        selector: CallbackSelector,
    ) -> Result<RequestId>;

    /// Check that `proof` authenticates `cleartexts` for exactly this request.
    fn verify_proof(&self, request_id: &RequestId, cleartexts: &[u8], proof: &[u8])
        -> Result<bool>;

    /// Address whose signatures this oracle accepts, when proofs are signatures
    fn signer(&self) -> Option<Address> {
        None
    }
}
