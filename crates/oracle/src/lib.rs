// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod cleartext;
mod local;
mod oracle;
mod proof;

pub use cleartext::*;
pub use local::*;
pub use oracle::*;
pub use proof::*;
