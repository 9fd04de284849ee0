// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_utils::SharedRng;
use anyhow::{anyhow, Result};
use fhe::bfv::{BfvParameters, PublicKey, SecretKey};
use std::sync::Arc;

/// A BFV key pair. The secret key stays with whoever decrypts, usually the oracle.
pub struct FheKeys {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl FheKeys {
    pub fn generate(params: &Arc<BfvParameters>, rng: &SharedRng) -> Result<Self> {
        let mut rng = rng.lock().map_err(|_| anyhow!("rng lock poisoned"))?;
        let secret_key = SecretKey::random(params, &mut *rng);
        let public_key = PublicKey::new(&secret_key, &mut *rng);
        Ok(Self {
            secret_key,
            public_key,
        })
    }
}
