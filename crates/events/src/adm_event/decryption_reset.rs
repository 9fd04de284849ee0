// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{RecordId, RequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A pending decryption failed terminally and the record is back to encrypted-only, so a
/// fresh decryption may be requested.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionReset {
    pub record_id: RecordId,
    pub request_id: RequestId,
    pub reason: String,
}

impl Display for DecryptionReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record_id: {}, request_id: {}, reason: {}",
            self.record_id, self.request_id, self.reason
        )
    }
}
