// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheSnapshot;
use adm_data::{Repositories, Repository};

pub const FHE_KEY: &str = "//fhe";

pub trait FheRepositoryFactory {
    fn fhe(&self) -> Repository<FheSnapshot>;
}

impl FheRepositoryFactory for Repositories {
    fn fhe(&self) -> Repository<FheSnapshot> {
        Repository::new(self.store.base(FHE_KEY))
    }
}
