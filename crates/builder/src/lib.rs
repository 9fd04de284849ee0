// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod builder;
mod ciphertexts;
mod datastore;
mod handle;

pub use builder::*;
pub use ciphertexts::*;
pub use datastore::*;
pub use handle::*;
