// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod adm_error;
mod decryption_requested;
mod decryption_reset;
mod record_decrypted;
mod record_submitted;
mod shutdown;
mod test_event;

pub use adm_error::*;
pub use decryption_requested::*;
pub use decryption_reset::*;
pub use record_decrypted::*;
pub use record_submitted::*;
pub use shutdown::*;
pub use test_event::*;

use crate::{ErrorEvent, Event, EventId, RecordId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares `AdmEvent` with one variant per payload type. Each variant carries the payload
/// and the id derived from hashing it.
macro_rules! adm_events {
    ($($(#[$meta:meta])* $variant:ident),* $(,)?) => {
        #[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[rtype(result = "()")]
        pub enum AdmEvent {
            $(
                $(#[$meta])*
                $variant { id: EventId, data: $variant },
            )*
        }

        impl AdmEvent {
            pub fn get_id(&self) -> EventId {
                match self {
                    $(AdmEvent::$variant { id, .. } => id.clone(),)*
                }
            }

            /// Name of the variant. Subscriptions are keyed on it.
            pub fn name(&self) -> &'static str {
                match self {
                    $(AdmEvent::$variant { .. } => stringify!($variant),)*
                }
            }

            fn payload(&self) -> &dyn fmt::Display {
                match self {
                    $(AdmEvent::$variant { data, .. } => data,)*
                }
            }
        }

        $(
            impl From<$variant> for AdmEvent {
                fn from(data: $variant) -> Self {
                    let id = EventId::hash(&data);
                    AdmEvent::$variant { id, data }
                }
            }
        )*
    };
}

adm_events!(
    RecordSubmitted,
    DecryptionRequested,
    RecordDecrypted,
    DecryptionReset,
    AdmError,
    Shutdown,
    /// Only published by tests
    TestEvent,
);

impl AdmEvent {
    /// The record this event is about, if any
    pub fn get_record_id(&self) -> Option<RecordId> {
        match self {
            AdmEvent::RecordSubmitted { data, .. } => Some(data.record_id),
            AdmEvent::DecryptionRequested { data, .. } => Some(data.record_id),
            AdmEvent::RecordDecrypted { data, .. } => Some(data.record_id),
            AdmEvent::DecryptionReset { data, .. } => Some(data.record_id),
            _ => None,
        }
    }
}

impl Event for AdmEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        self.name().to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for AdmEvent {
    type Error = AdmError;
    type ErrorType = AdmErrorType;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            AdmEvent::AdmError { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, error: anyhow::Error) -> Self {
        AdmEvent::from(AdmError::from_error(err_type, error))
    }
}

impl fmt::Display for AdmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestId;
    use alloy_primitives::Address;

    #[test]
    fn test_event_type_is_variant_name() {
        let evt = AdmEvent::from(RecordDecrypted {
            record_id: RecordId(3),
        });
        assert_eq!(evt.event_type(), "RecordDecrypted");
        assert_eq!(evt.get_record_id(), Some(RecordId(3)));
        assert_eq!(evt.to_string(), "RecordDecrypted(record_id: rec:3)");
    }

    #[test]
    fn test_identical_payloads_share_an_id() {
        let data = DecryptionRequested {
            record_id: RecordId(1),
            request_id: RequestId([9u8; 32]),
            requester: Address::ZERO,
        };
        let a = AdmEvent::from(data.clone());
        let b = AdmEvent::from(data.clone());
        let c = AdmEvent::from(DecryptionRequested {
            request_id: RequestId([8u8; 32]),
            ..data
        });
        assert_eq!(a.get_id(), b.get_id());
        assert_ne!(a.get_id(), c.get_id());
    }

    #[test]
    fn test_error_events_are_exposed() -> anyhow::Result<()> {
        let evt = AdmEvent::from_error(AdmErrorType::Security, anyhow::anyhow!("bad proof"));
        let err = evt.as_error().cloned().expect("error event");
        assert_eq!(err.err_type, AdmErrorType::Security);
        assert_eq!(err.message, "bad proof");
        assert_eq!(evt.to_string(), "AdmError(Security: bad proof)");
        Ok(())
    }
}
