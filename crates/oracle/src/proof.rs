// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Signed decryption proofs.
//!
//! The oracle signs `keccak256(abi.encodePacked(requestId, cleartexts))` as an EIP-191 personal
//! message. The resulting 65 byte signature (r ‖ s ‖ v) is the proof passed to the callback,
//! so a verifier only needs the oracle's address.

use adm_events::RequestId;
use alloy::primitives::{keccak256, Address, Bytes, FixedBytes, Signature};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy::sol_types::SolValue;
use anyhow::{anyhow, Result};

pub const PROOF_LEN: usize = 65;

/// Digest covered by a decryption proof
pub fn decryption_digest(request_id: &RequestId, cleartexts: &[u8]) -> [u8; 32] {
    let encoded = (
        FixedBytes::<32>::from(request_id.0),
        Bytes::copy_from_slice(cleartexts),
    )
        .abi_encode_packed();

    keccak256(&encoded).into()
}

pub fn sign_decryption(
    signer: &PrivateKeySigner,
    request_id: &RequestId,
    cleartexts: &[u8],
) -> Result<Vec<u8>> {
    let digest = decryption_digest(request_id, cleartexts);
    let sig = signer
        .sign_message_sync(&digest)
        .map_err(|e| anyhow!("Failed to sign decryption result: {e}"))?;
    Ok(sig.as_bytes().to_vec())
}

pub fn recover_decryption_signer(
    request_id: &RequestId,
    cleartexts: &[u8],
    proof: &[u8],
) -> Result<Address> {
    if proof.len() != PROOF_LEN {
        return Err(anyhow!(
            "Proof must be {PROOF_LEN} bytes, got {}",
            proof.len()
        ));
    }
    let sig = Signature::try_from(proof).map_err(|e| anyhow!("Invalid signature: {e}"))?;
    let digest = decryption_digest(request_id, cleartexts);
    sig.recover_address_from_msg(&digest)
        .map_err(|e| anyhow!("Failed to recover signer address: {e}"))
}

/// True when `proof` was produced by `expected` over these cleartexts for this request.
/// Malformed proofs are errors rather than `false`.
pub fn verify_decryption_proof(
    expected: &Address,
    request_id: &RequestId,
    cleartexts: &[u8],
    proof: &[u8],
) -> Result<bool> {
    Ok(recover_decryption_signer(request_id, cleartexts, proof)? == *expected)
}
