// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::sol_types::SolValue;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const WORD: usize = 32;

/// Cleartext payload length: three ABI words
pub const CLEARTEXT_LEN: usize = 3 * WORD;

/// Plaintext counters of one record in wire order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counters {
    pub impressions: u32,
    pub clicks: u32,
    pub conversions: u32,
}

impl Counters {
    pub fn new(impressions: u32, clicks: u32, conversions: u32) -> Self {
        Self {
            impressions,
            clicks,
            conversions,
        }
    }

    /// ABI encoding of `(uint32, uint32, uint32)`
    pub fn to_abi(&self) -> Vec<u8> {
        (self.impressions, self.clicks, self.conversions).abi_encode()
    }

    /// Strict inverse of [`Counters::to_abi`]. The payload must be exactly three words and each
    /// word must fit in a `uint32`.
    pub fn from_abi(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != CLEARTEXT_LEN {
            bail!(
                "Expected {CLEARTEXT_LEN} cleartext bytes, got {}",
                bytes.len()
            );
        }

        let (impressions, clicks, conversions) = <(u32, u32, u32)>::abi_decode_validate(bytes)
            .context("Cleartext is not an ABI encoded (uint32, uint32, uint32)")?;
        let counters = Self::new(impressions, clicks, conversions);
        // Reject any padding the decoder let through
        if counters.to_abi() != bytes {
            bail!("Cleartext words are not canonical uint32 values");
        }
        Ok(counters)
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "impressions: {}, clicks: {}, conversions: {}",
            self.impressions, self.clicks, self.conversions
        )
    }
}
