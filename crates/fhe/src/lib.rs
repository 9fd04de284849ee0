// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod fhe;
mod keys;
mod ops;
mod presets;
mod repo;

pub use fhe::*;
pub use keys::*;
pub use ops::*;
pub use presets::*;
pub use repo::*;
