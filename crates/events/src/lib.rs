// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod adm_event;
mod event_id;
mod eventbus;
mod ids;
mod traits;

pub use adm_event::*;
pub use event_id::*;
pub use eventbus::*;
pub use ids::*;
pub use traits::*;

pub use alloy_primitives::Address;
