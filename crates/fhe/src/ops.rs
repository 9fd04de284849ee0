// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::CiphertextHandle;
use anyhow::Result;

/// Homomorphic operations the ledger needs. Implementations own the ciphertexts and hand out
/// fixed-width handles; the ledger never looks inside a ciphertext.
pub trait CiphertextOps: Send + Sync {
    /// A ciphertext that decrypts to 0
    fn zero(&self) -> Result<CiphertextHandle>;

    /// Homomorphic sum of two ciphertexts
    fn add(&self, lhs: &CiphertextHandle, rhs: &CiphertextHandle) -> Result<CiphertextHandle>;

    /// Homomorphic sum of every handle, `zero()` when there are none. Implementations that
    /// keep state per handle override this so only the total is kept.
    fn sum(&self, handles: &[CiphertextHandle]) -> Result<CiphertextHandle> {
        handles
            .iter()
            .try_fold(self.zero()?, |total, handle| self.add(&total, handle))
    }
}
