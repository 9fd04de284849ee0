// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::EncryptedRecord;
use adm_config::PolicyKind;
use adm_events::{Address, RecordId};
use std::sync::Arc;

/// Decides who may ask for a record to be revealed
pub trait DecryptionPolicy: Send + Sync {
    fn may_request(&self, requester: &Address, record_id: RecordId, record: &EncryptedRecord)
        -> bool;
}

/// Anyone may request decryption of any record
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenPolicy;

impl DecryptionPolicy for OpenPolicy {
    fn may_request(&self, _: &Address, _: RecordId, _: &EncryptedRecord) -> bool {
        true
    }
}

/// Only the account that submitted a record may request its decryption
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitterOnlyPolicy;

impl DecryptionPolicy for SubmitterOnlyPolicy {
    fn may_request(&self, requester: &Address, _: RecordId, record: &EncryptedRecord) -> bool {
        *requester == record.submitter
    }
}

pub fn policy_for(kind: PolicyKind) -> Arc<dyn DecryptionPolicy> {
    match kind {
        PolicyKind::Open => Arc::new(OpenPolicy),
        PolicyKind::SubmitterOnly => Arc::new(SubmitterOnlyPolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_events::CiphertextHandle;

    fn record(submitter: Address) -> EncryptedRecord {
        EncryptedRecord {
            impressions: CiphertextHandle([1u8; 32]),
            clicks: CiphertextHandle([2u8; 32]),
            conversions: CiphertextHandle([3u8; 32]),
            submitter,
            created_at: 0,
        }
    }

    #[test]
    fn test_policies() {
        let owner = Address::repeat_byte(0xaa);
        let stranger = Address::repeat_byte(0xbb);
        let rec = record(owner);

        let open = policy_for(PolicyKind::Open);
        assert!(open.may_request(&stranger, RecordId(1), &rec));

        let strict = policy_for(PolicyKind::SubmitterOnly);
        assert!(strict.may_request(&owner, RecordId(1), &rec));
        assert!(!strict.may_request(&stranger, RecordId(1), &rec));
    }
}
