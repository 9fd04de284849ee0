// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

/// Shared rng seeded from system entropy
pub fn create_shared_rng() -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::from_entropy()))
}

/// Deterministic shared rng. Only for tests and reproducible fixtures.
pub fn create_shared_rng_from_u64(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed)))
}

/// Draw 32 random bytes from the shared rng. A poisoned lock is recovered as the rng
/// state cannot be left inconsistent by a panicking reader.
pub fn random_bytes32(rng: &SharedRng) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut guard = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let a = create_shared_rng_from_u64(7);
        let b = create_shared_rng_from_u64(7);
        assert_eq!(random_bytes32(&a), random_bytes32(&b));
        assert_ne!(random_bytes32(&a), random_bytes32(&a));
    }
}
