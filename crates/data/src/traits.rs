// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, Remove};
use anyhow::Result;

/// Synchronous key value backend driven by a storage actor
pub trait KeyValStore {
    fn insert(&mut self, msg: Insert) -> Result<()>;
    fn remove(&mut self, msg: Remove) -> Result<()>;
    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>>;
    /// Block until earlier writes are durable
    fn flush(&self) -> Result<()>;
}
