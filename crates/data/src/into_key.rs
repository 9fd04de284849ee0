// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Anything that can name a location in the store
pub trait IntoKey {
    fn into_key(self) -> Vec<u8>;
}

impl IntoKey for Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self
    }
}

impl IntoKey for &[u8] {
    fn into_key(self) -> Vec<u8> {
        self.to_vec()
    }
}

impl IntoKey for &Vec<u8> {
    fn into_key(self) -> Vec<u8> {
        self.as_slice().into_key()
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Vec<u8> {
        self.as_bytes().into_key()
    }
}

impl IntoKey for String {
    fn into_key(self) -> Vec<u8> {
        self.into_bytes()
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Vec<u8> {
        self.as_str().into_key()
    }
}

/// Path segments, joined with `/`
impl IntoKey for &[&str] {
    fn into_key(self) -> Vec<u8> {
        self.join("/").into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_forms_agree() {
        let expected = b"//ledger/requests".to_vec();
        assert_eq!("//ledger/requests".into_key(), expected);
        assert_eq!(String::from("//ledger/requests").into_key(), expected);
        assert_eq!(["//ledger", "requests"].as_slice().into_key(), expected);
        assert_eq!((&expected).into_key(), expected);
    }
}
