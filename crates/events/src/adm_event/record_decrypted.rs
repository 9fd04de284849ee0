// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::RecordId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The counters of a record are public. Fired exactly once per record.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct RecordDecrypted {
    pub record_id: RecordId,
}

impl Display for RecordDecrypted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record_id: {}", self.record_id)
    }
}
