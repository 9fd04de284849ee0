// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_utils::{hex_short, hexf};
use alloy_primitives::keccak256;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential identifier of an encrypted record. Ids start at 1; 0 is reserved and never issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    pub const NONE: RecordId = RecordId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Index of this record in the append-only ledger tables
    pub fn index(&self) -> Option<usize> {
        self.0.checked_sub(1).and_then(|i| usize::try_from(i).ok())
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u64::try_from(index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .map(RecordId)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec:{}", self.0)
    }
}

macro_rules! bytes32_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn try_from_slice(bytes: &[u8]) -> Result<Self> {
                let inner: [u8; 32] = bytes.try_into().map_err(|_| {
                    anyhow!(
                        "{} must be exactly 32 bytes, got {}",
                        stringify!($name),
                        bytes.len()
                    )
                })?;
                Ok(Self(inner))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(value: [u8; 32]) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, hex_short(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                hexf(&self.0, f)
            }
        }
    };
}

bytes32_id!(RequestId, "req");
bytes32_id!(CiphertextHandle, "ct");

/// Solidity style signature of the callback the oracle invokes when a decryption completes
pub const DECRYPTION_CALLBACK_SIGNATURE: &str = "onDecryptionCallback(bytes32,bytes,bytes)";

/// Four byte function selector handed to the oracle so it knows where to deliver results
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackSelector(pub [u8; 4]);

impl CallbackSelector {
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }

    pub fn decryption_callback() -> Self {
        Self::from_signature(DECRYPTION_CALLBACK_SIGNATURE)
    }
}

impl fmt::Display for CallbackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(&self.0, f)
    }
}

impl fmt::Debug for CallbackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hexf(&self.0, f)
    }
}
