// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::CiphertextHandle;
use adm_fhe::CiphertextOps;
use anyhow::{anyhow, bail, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::trace;

const MOCK_TAG: &[u8; 8] = b"mock-ct\0";

/// Ciphertext capability whose handles carry their plaintext in the clear, so tests can check
/// homomorphic sums without any real encryption.
#[derive(Debug, Default)]
pub struct MockCiphertexts {
    adds: AtomicUsize,
    failing: AtomicBool,
}

impl MockCiphertexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encrypt(&self, value: u32) -> CiphertextHandle {
        encode(value as u64)
    }

    pub fn value_of(&self, handle: &CiphertextHandle) -> Result<u64> {
        decode(handle)
    }

    /// Number of additions performed so far
    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    /// Make every operation fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Ciphertext capability unavailable");
        }
        Ok(())
    }
}

fn encode(value: u64) -> CiphertextHandle {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(MOCK_TAG);
    bytes[24..].copy_from_slice(&value.to_be_bytes());
    CiphertextHandle(bytes)
}

fn decode(handle: &CiphertextHandle) -> Result<u64> {
    let bytes = handle.as_bytes();
    if &bytes[..8] != MOCK_TAG {
        bail!("{handle} was not produced by MockCiphertexts");
    }
    let mut value = [0u8; 8];
    value.copy_from_slice(&bytes[24..]);
    Ok(u64::from_be_bytes(value))
}

impl CiphertextOps for MockCiphertexts {
    fn zero(&self) -> Result<CiphertextHandle> {
        self.check_available()?;
        Ok(encode(0))
    }

    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle> {
        self.check_available()?;
        let sum = decode(lhs)?
            .checked_add(decode(rhs)?)
            .ok_or_else(|| anyhow!("Mock ciphertext overflow"))?;
        self.adds.fetch_add(1, Ordering::SeqCst);
        trace!("mock add -> {sum}");
        Ok(encode(sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_handles_add_up() -> Result<()> {
        let ops = MockCiphertexts::new();
        let sum = ops.add(&ops.encrypt(40), &ops.encrypt(2))?;
        assert_eq!(ops.value_of(&sum)?, 42);
        assert_eq!(ops.value_of(&ops.zero()?)?, 0);
        assert_eq!(ops.adds(), 1);

        assert!(ops.value_of(&CiphertextHandle([7u8; 32])).is_err());

        ops.set_failing(true);
        assert!(ops.zero().is_err());
        Ok(())
    }
}
