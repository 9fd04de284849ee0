// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::RecordId;
use actix::Message;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// An encrypted record was appended to the ledger
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct RecordSubmitted {
    pub record_id: RecordId,
    pub submitter: Address,
    /// Unix time in seconds
    pub timestamp: u64,
}

impl Display for RecordSubmitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record_id: {}, submitter: {}, timestamp: {}",
            self.record_id, self.submitter, self.timestamp
        )
    }
}
