// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::IntoKey;
use actix::Message;
use anyhow::Result;

// Raw store operations handled by `InMemStore` and `SledStore`. Keys are full scope paths
// (eg. `//ledger`) and values are bincode encoded.

macro_rules! write_op {
    ($name:ident, $result:ty) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub Vec<u8>, pub Vec<u8>);

        impl $name {
            pub fn new<K: IntoKey>(key: K, value: Vec<u8>) -> Self {
                Self(key.into_key(), value)
            }

            pub fn key(&self) -> &Vec<u8> {
                &self.0
            }

            pub fn value(&self) -> &Vec<u8> {
                &self.1
            }
        }

        impl Message for $name {
            type Result = $result;
        }
    };
}

macro_rules! key_op {
    ($name:ident, $result:ty) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub Vec<u8>);

        impl $name {
            pub fn new<K: IntoKey>(key: K) -> Self {
                Self(key.into_key())
            }

            pub fn key(&self) -> &Vec<u8> {
                &self.0
            }
        }

        impl Message for $name {
            type Result = $result;
        }
    };
}

write_op!(Insert, ());
// Acknowledged once the value is durable
write_op!(InsertSync, Result<()>);
key_op!(Get, Option<Vec<u8>>);
key_op!(Remove, ());

impl From<InsertSync> for Insert {
    fn from(value: InsertSync) -> Self {
        Insert(value.0, value.1)
    }
}
