// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::{Address, RecordId, RequestId};
use thiserror::Error;

pub type MetricsResult<T> = std::result::Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Record {0} has already been revealed")]
    AlreadyRevealed(RecordId),
    #[error("Record {0} already has pending decryption request {1}")]
    RequestAlreadyPending(RecordId, RequestId),
    #[error("Unknown record {0}")]
    UnknownRecord(RecordId),
    #[error("Unknown or consumed decryption request {0}")]
    InvalidRequest(RequestId),
    #[error("Decryption proof for {0} failed verification")]
    InvalidProof(RequestId),
    #[error("Malformed cleartext for {request_id}: {reason}")]
    MalformedCleartext {
        request_id: RequestId,
        reason: String,
    },
    #[error("{requester} may not request decryption of record {record_id}")]
    Unauthorized {
        record_id: RecordId,
        requester: Address,
    },
    #[error("Record id space exhausted")]
    RecordIdsExhausted,
    #[error("Capability failure: {0:#}")]
    Capability(anyhow::Error),
    #[error("Persistence failure: {0:#}")]
    Persistence(anyhow::Error),
    #[error(transparent)]
    Mailbox(#[from] actix::MailboxError),
}

impl MetricsError {
    /// Recover a domain error that travelled through an `anyhow` boundary. Anything else is
    /// treated as a persistence failure.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<MetricsError>() {
            Ok(err) => err,
            Err(err) => MetricsError::Persistence(err),
        }
    }
}
