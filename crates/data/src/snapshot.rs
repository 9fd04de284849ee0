// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Repository;
use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Produces a serializable copy of an object's persisted state.
pub trait Snapshot
where
    Self: Sized,
{
    type Snapshot: Serialize + DeserializeOwned;

    fn snapshot(&self) -> Result<Self::Snapshot>;
}

/// Writes the current snapshot to the object's repository.
pub trait Checkpoint: Snapshot {
    fn repository(&self) -> &Repository<Self::Snapshot>;

    fn checkpoint(&self) {
        // Nothing to write while the object holds no state
        let Ok(snapshot) = self.snapshot() else {
            return;
        };

        self.repository().write(&snapshot);
    }

    fn clear_checkpoint(&self) {
        self.repository().clear()
    }
}

/// Rebuild an object from a snapshot plus runtime parameters that are not persisted.
#[async_trait]
pub trait FromSnapshotWithParams: Snapshot {
    type Params: Send + 'static;

    async fn from_snapshot(params: Self::Params, snapshot: Self::Snapshot) -> Result<Self>;
}
