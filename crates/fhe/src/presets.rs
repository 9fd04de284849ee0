// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod insecure_512 {
    pub const DEGREE: usize = 512;
    pub const PLAINTEXT_MODULUS: u64 = 0xffffee001;
    pub const MODULI: &[u64] = &[0x7fffffffe0001];
    pub const VARIANCE: usize = 3;
}

mod secure_8192 {
    pub const DEGREE: usize = 8192;
    pub const PLAINTEXT_MODULUS: u64 = 144115188075855872;
    pub const MODULI: &[u64] = &[288230376173076481, 288230376167047169];
}

/// BFV parameter sets. Both plaintext moduli exceed `u32::MAX` so a sum of counters only wraps
/// once it passes the modulus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FhePreset {
    /// Small ring for tests and local development. Not secure.
    Insecure512,
    #[default]
    Secure8192,
}

impl FhePreset {
    pub fn name(&self) -> &'static str {
        match self {
            FhePreset::Insecure512 => "insecure512",
            FhePreset::Secure8192 => "secure8192",
        }
    }

    pub fn plaintext_modulus(&self) -> u64 {
        match self {
            FhePreset::Insecure512 => insecure_512::PLAINTEXT_MODULUS,
            FhePreset::Secure8192 => secure_8192::PLAINTEXT_MODULUS,
        }
    }

    pub fn build_params(&self) -> Result<Arc<BfvParameters>> {
        let params = match self {
            FhePreset::Insecure512 => BfvParametersBuilder::new()
                .set_degree(insecure_512::DEGREE)
                .set_plaintext_modulus(insecure_512::PLAINTEXT_MODULUS)
                .set_moduli(insecure_512::MODULI)
                .set_variance(insecure_512::VARIANCE)
                .build_arc(),
            FhePreset::Secure8192 => BfvParametersBuilder::new()
                .set_degree(secure_8192::DEGREE)
                .set_plaintext_modulus(secure_8192::PLAINTEXT_MODULUS)
                .set_moduli(secure_8192::MODULI)
                .build_arc(),
        };
        params.with_context(|| format!("Could not build BFV parameters for {}", self.name()))
    }
}
