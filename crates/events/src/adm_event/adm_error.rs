// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct AdmError {
    pub err_type: AdmErrorType,
    pub message: String,
}

impl Display for AdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.err_type, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdmErrorType {
    /// Storage failures
    Data,
    /// Ciphertext capability failures
    Fhe,
    /// Oracle capability failures
    Oracle,
    /// Ledger state could not be updated
    Ledger,
    /// Rejected callbacks that may be an attack
    Security,
}

impl AdmError {
    pub fn new(err_type: AdmErrorType, message: &str) -> Self {
        Self {
            err_type,
            message: message.to_string(),
        }
    }

    pub fn from_error(err_type: AdmErrorType, error: anyhow::Error) -> Self {
        Self {
            err_type,
            message: error.to_string(),
        }
    }
}
