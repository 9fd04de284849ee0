// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextOps;
use adm_data::{FromSnapshotWithParams, Repository, Snapshot};
use adm_events::CiphertextHandle;
use adm_utils::SharedRng;
use alloy_primitives::keccak256;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use fhe::bfv::{BfvParameters, Ciphertext, Encoding, Plaintext, PublicKey, SecretKey};
use fhe_traits::{
    Deserialize, DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter,
    Serialize,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, trace};

type Registry = Arc<Mutex<HashMap<CiphertextHandle, Arc<Ciphertext>>>>;

/// BFV backed ciphertext capability.
///
/// Every ciphertext this adaptor produces or imports is kept in a registry under its handle,
/// the keccak256 of its serialized form. Clones share the registry. When built with
/// [`Fhe::load_or_new`] the registry is written to its repository whenever a handle is added.
#[derive(Clone)]
pub struct Fhe {
    pub params: Arc<BfvParameters>,
    public_key: Arc<PublicKey>,
    rng: SharedRng,
    registry: Registry,
    zero: Arc<Mutex<Option<CiphertextHandle>>>,
    repository: Option<Repository<FheSnapshot>>,
}

impl Fhe {
    pub fn new(params: Arc<BfvParameters>, public_key: PublicKey, rng: SharedRng) -> Self {
        Self {
            params,
            public_key: Arc::new(public_key),
            rng,
            registry: Arc::new(Mutex::new(HashMap::new())),
            zero: Arc::new(Mutex::new(None)),
            repository: None,
        }
    }

    /// Restore the registry stored in `repository`, or start an empty one, and keep it
    /// persisted from then on. Stored state made under other parameters or another public key
    /// is refused.
    pub async fn load_or_new(
        repository: Repository<FheSnapshot>,
        params: Arc<BfvParameters>,
        public_key: &[u8],
        rng: SharedRng,
    ) -> Result<Self> {
        let fresh = Fhe::from_public_key_bytes(params, public_key, rng.clone())?;
        let mut fhe = match repository.read().await? {
            Some(snapshot) => {
                if snapshot.params != fresh.params.to_bytes()
                    || snapshot.public_key != fresh.public_key_bytes()
                {
                    bail!("Stored ciphertexts were made under different BFV parameters or key");
                }
                let restored = Fhe::from_snapshot(rng, snapshot).await?;
                info!("Restored {} ciphertexts", restored.registered()?);
                restored
            }
            None => fresh,
        };
        fhe.repository = Some(repository);
        fhe.persist();
        Ok(fhe)
    }

    pub fn from_public_key_bytes(
        params: Arc<BfvParameters>,
        public_key: &[u8],
        rng: SharedRng,
    ) -> Result<Self> {
        let public_key = PublicKey::from_bytes(public_key, &params)
            .map_err(|e| anyhow!("Error deserializing public key: {e}"))?;
        Ok(Self::new(params, public_key, rng))
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes()
    }

    /// Encrypt a counter under the public key and register the ciphertext
    pub fn encrypt(&self, value: u32) -> Result<CiphertextHandle> {
        let input = vec![u64::from(value)];
        let pt = Plaintext::try_encode(&input, Encoding::poly(), &self.params)
            .map_err(|e| anyhow!("Error encoding plaintext: {e}"))?;
        let ct = {
            let mut rng = self.rng.lock().map_err(|_| anyhow!("rng lock poisoned"))?;
            self.public_key
                .try_encrypt(&pt, &mut *rng)
                .map_err(|e| anyhow!("Error encrypting data: {e}"))?
        };
        self.register(ct)
    }

    /// Register a serialized ciphertext produced elsewhere
    pub fn import(&self, bytes: &[u8]) -> Result<CiphertextHandle> {
        let ct = Ciphertext::from_bytes(bytes, &self.params)
            .map_err(|e| anyhow!("Error deserializing ciphertext: {e}"))?;
        self.register(ct)
    }

    pub fn export(&self, handle: &CiphertextHandle) -> Result<Vec<u8>> {
        Ok(self.get(handle)?.to_bytes())
    }

    /// Decrypt the constant coefficient of a registered ciphertext
    pub fn decrypt(&self, secret_key: &SecretKey, handle: &CiphertextHandle) -> Result<u64> {
        let ct = self.get(handle)?;
        let pt = secret_key
            .try_decrypt(&*ct)
            .map_err(|e| anyhow!("Error decrypting {handle}: {e}"))?;
        let decoded = Vec::<u64>::try_decode(&pt, Encoding::poly())
            .map_err(|e| anyhow!("Error decoding plaintext: {e}"))?;
        decoded
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Decoded plaintext for {handle} was empty"))
    }

    pub fn contains(&self, handle: &CiphertextHandle) -> Result<bool> {
        Ok(self.registry()?.contains_key(handle))
    }

    /// Number of ciphertexts held
    pub fn registered(&self) -> Result<usize> {
        Ok(self.registry()?.len())
    }

    fn get(&self, handle: &CiphertextHandle) -> Result<Arc<Ciphertext>> {
        self.registry()?
            .get(handle)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown ciphertext handle {handle}"))
    }

    fn register(&self, ct: Ciphertext) -> Result<CiphertextHandle> {
        let handle = CiphertextHandle(keccak256(ct.to_bytes()).0);
        let added = self.registry()?.insert(handle, Arc::new(ct)).is_none();
        if added {
            self.persist();
        }
        Ok(handle)
    }

    fn persist(&self) {
        let Some(repository) = &self.repository else {
            return;
        };
        match self.snapshot() {
            Ok(snapshot) => repository.write(&snapshot),
            Err(err) => error!("Could not snapshot ciphertext registry: {err:#}"),
        }
    }

    fn registry(&self) -> Result<MutexGuard<'_, HashMap<CiphertextHandle, Arc<Ciphertext>>>> {
        self.registry
            .lock()
            .map_err(|_| anyhow!("ciphertext registry lock poisoned"))
    }
}

impl CiphertextOps for Fhe {
    /// One encryption of 0 per adaptor, reused by every caller
    fn zero(&self) -> Result<CiphertextHandle> {
        let mut zero = self
            .zero
            .lock()
            .map_err(|_| anyhow!("zero ciphertext lock poisoned"))?;
        if let Some(handle) = *zero {
            return Ok(handle);
        }
        let handle = self.encrypt(0)?;
        *zero = Some(handle);
        Ok(handle)
    }

    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle> {
        let sum = &*self.get(lhs)? + &*self.get(rhs)?;
        let handle = self.register(sum)?;
        trace!("{lhs} + {rhs} -> {handle}");
        Ok(handle)
    }

    /// Folds the ciphertexts directly and registers only the total. Addition is deterministic
    /// so summing the same handles again yields the same handle and adds nothing.
    fn sum(&self, handles: &[CiphertextHandle]) -> Result<CiphertextHandle> {
        let Some((first, rest)) = handles.split_first() else {
            return self.zero();
        };
        let mut total = (*self.get(first)?).clone();
        for handle in rest {
            total = &total + &*self.get(handle)?;
        }
        let handle = self.register(total)?;
        trace!("Sum of {} ciphertexts -> {handle}", handles.len());
        Ok(handle)
    }
}

/// Serialized parameters, public key and registered ciphertexts
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct FheSnapshot {
    params: Vec<u8>,
    public_key: Vec<u8>,
    ciphertexts: Vec<Vec<u8>>,
}

impl Snapshot for Fhe {
    type Snapshot = FheSnapshot;
    fn snapshot(&self) -> Result<Self::Snapshot> {
        let ciphertexts = self
            .registry()?
            .values()
            .map(|ct| ct.to_bytes())
            .collect();
        Ok(FheSnapshot {
            params: self.params.to_bytes(),
            public_key: self.public_key.to_bytes(),
            ciphertexts,
        })
    }
}

#[async_trait]
impl FromSnapshotWithParams for Fhe {
    type Params = SharedRng;
    async fn from_snapshot(rng: SharedRng, snapshot: FheSnapshot) -> Result<Self> {
        let params = Arc::new(
            BfvParameters::try_deserialize(&snapshot.params)
                .context("Could not deserialize BFV parameters")?,
        );
        let fhe = Fhe::from_public_key_bytes(params, &snapshot.public_key, rng)?;
        for bytes in &snapshot.ciphertexts {
            fhe.import(bytes)?;
        }
        Ok(fhe)
    }
}
