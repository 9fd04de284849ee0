// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DataStore;

/// Handle from which each crate derives the typed repositories it persists to.
///
/// Crates add a factory trait implemented for `Repositories`, one method per stored key.
#[derive(Clone, Debug)]
pub struct Repositories {
    pub store: DataStore,
}

impl Repositories {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }
}

pub trait RepositoriesFactory {
    fn repositories(&self) -> Repositories;
}

impl RepositoriesFactory for DataStore {
    fn repositories(&self) -> Repositories {
        Repositories::new(self.clone())
    }
}
