// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod coordinator;
mod error;
mod ledger;
mod policy;
mod repo;
mod state;

pub use coordinator::*;
pub use error::*;
pub use ledger::*;
pub use policy::*;
pub use repo::*;
pub use state::*;
