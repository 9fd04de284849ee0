// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{sign_decryption, verify_decryption_proof, Counters, DecryptionOracle};
use adm_events::{CallbackSelector, CiphertextHandle, RequestId};
use adm_fhe::Fhe;
use adm_utils::{random_bytes32, ArcBytes, SharedRng};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use derivative::Derivative;
use fhe::bfv::SecretKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// What the oracle sends back through the decryption callback
#[derive(Derivative, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derivative(Debug)]
pub struct DecryptionResponse {
    pub request_id: RequestId,
    #[derivative(Debug(format_with = "adm_utils::hexf"))]
    pub cleartexts: ArcBytes,
    #[derivative(Debug(format_with = "adm_utils::hexf"))]
    pub proof: ArcBytes,
}

#[derive(Clone, Debug)]
struct PendingDecryption {
    handles: Vec<CiphertextHandle>,
    selector: CallbackSelector,
}

/// In-process oracle holding the BFV secret key and an ECDSA signing key.
///
/// Requests are only recorded; [`LocalOracle::fulfill`] performs the decryption and produces
/// the signed response a relayer would deliver to the coordinator.
#[derive(Clone)]
pub struct LocalOracle {
    fhe: Fhe,
    secret_key: Arc<SecretKey>,
    signer: PrivateKeySigner,
    rng: SharedRng,
    requests: Arc<Mutex<HashMap<RequestId, PendingDecryption>>>,
}

impl LocalOracle {
    pub fn new(fhe: Fhe, secret_key: SecretKey, signer: PrivateKeySigner, rng: SharedRng) -> Self {
        Self {
            fhe,
            secret_key: Arc::new(secret_key),
            signer,
            rng,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Request ids that have not been fulfilled yet
    pub fn pending(&self) -> Result<Vec<RequestId>> {
        Ok(self.lock()?.keys().copied().collect())
    }

    /// Decrypt the ciphertexts of a pending request and sign the result. The request is
    /// consumed.
    pub fn fulfill(&self, request_id: &RequestId) -> Result<DecryptionResponse> {
        let pending = self
            .lock()?
            .remove(request_id)
            .ok_or_else(|| anyhow!("No pending decryption for {request_id}"))?;

        if pending.selector != CallbackSelector::decryption_callback() {
            bail!("Unsupported callback selector {}", pending.selector);
        }

        let values = pending
            .handles
            .iter()
            .map(|handle| {
                let value = self.fhe.decrypt(&self.secret_key, handle)?;
                u32::try_from(value).map_err(|_| anyhow!("Decrypted value {value} exceeds uint32"))
            })
            .collect::<Result<Vec<u32>>>()?;

        let &[impressions, clicks, conversions] = values.as_slice() else {
            bail!("Expected 3 ciphertexts, got {}", values.len());
        };

        let cleartexts = Counters::new(impressions, clicks, conversions).to_abi();
        let proof = sign_decryption(&self.signer, request_id, &cleartexts)?;
        info!("Fulfilled decryption {request_id}");

        Ok(DecryptionResponse {
            request_id: *request_id,
            cleartexts: ArcBytes::from_bytes(cleartexts),
            proof: ArcBytes::from_bytes(proof),
        })
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<RequestId, PendingDecryption>>> {
        self.requests
            .lock()
            .map_err(|_| anyhow!("oracle request lock poisoned"))
    }
}

#[async_trait]
impl DecryptionOracle for LocalOracle {
    async fn request_decryption(
        &self,
        handles: Vec<CiphertextHandle>,
        selector: CallbackSelector,
    ) -> Result<RequestId> {
        for handle in &handles {
            if !self.fhe.contains(handle)? {
                bail!("Unknown ciphertext handle {handle}");
            }
        }
        let request_id = RequestId(random_bytes32(&self.rng));
        self.lock()?
            .insert(request_id, PendingDecryption { handles, selector });
        info!("Accepted decryption request {request_id}");
        Ok(request_id)
    }

    fn verify_proof(&self, request_id: &RequestId, cleartexts: &[u8], proof: &[u8]) -> Result<bool> {
        verify_decryption_proof(&self.signer.address(), request_id, cleartexts, proof)
    }

    fn signer(&self) -> Option<Address> {
        Some(self.signer.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_fhe::{FheKeys, FhePreset};
    use adm_utils::create_shared_rng_from_u64;

    fn setup() -> Result<LocalOracle> {
        let rng = create_shared_rng_from_u64(11);
        let params = FhePreset::Insecure512.build_params()?;
        let keys = FheKeys::generate(&params, &rng)?;
        let fhe = Fhe::new(params, keys.public_key, rng.clone());
        Ok(LocalOracle::new(
            fhe,
            keys.secret_key,
            PrivateKeySigner::random(),
            rng,
        ))
    }

    #[actix::test]
    async fn test_fulfill_produces_verifiable_counters() -> Result<()> {
        let oracle = setup()?;
        let handles = vec![
            oracle.fhe.encrypt(100)?,
            oracle.fhe.encrypt(10)?,
            oracle.fhe.encrypt(2)?,
        ];
        let request_id = oracle
            .request_decryption(handles, CallbackSelector::decryption_callback())
            .await?;
        assert_eq!(oracle.pending()?, vec![request_id]);

        let response = oracle.fulfill(&request_id)?;
        assert_eq!(
            Counters::from_abi(&response.cleartexts)?,
            Counters::new(100, 10, 2)
        );
        assert!(oracle.verify_proof(&request_id, &response.cleartexts, &response.proof)?);
        assert!(oracle.pending()?.is_empty());
        assert!(oracle.fulfill(&request_id).is_err());
        Ok(())
    }

    #[actix::test]
    async fn test_unknown_handles_are_refused() -> Result<()> {
        let oracle = setup()?;
        let result = oracle
            .request_decryption(
                vec![CiphertextHandle([1u8; 32])],
                CallbackSelector::decryption_callback(),
            )
            .await;
        assert!(result.is_err());
        Ok(())
    }

    #[actix::test]
    async fn test_request_ids_are_unique() -> Result<()> {
        let oracle = setup()?;
        let handle = oracle.fhe.encrypt(1)?;
        let selector = CallbackSelector::decryption_callback();
        let a = oracle.request_decryption(vec![handle; 3], selector).await?;
        let b = oracle.request_decryption(vec![handle; 3], selector).await?;
        assert_ne!(a, b);
        Ok(())
    }
}
