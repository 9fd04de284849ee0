// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod mock_ciphertexts;
mod mock_oracle;

pub use adm_utils::create_shared_rng_from_u64;
pub use mock_ciphertexts::*;
pub use mock_oracle::*;
