// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CoordinatorError;
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy_primitives::{keccak256, B256};

/// Canonical digest of a decrypted result: keccak-256 over the 8-byte
/// little-endian encoding of the integer.
pub fn result_digest(value: u64) -> B256 {
    keccak256(value.to_le_bytes())
}

/// Sign the digest of a decrypted result with the client's wallet key.
/// Local and offline; RFC 6979 makes the signature deterministic for the
/// same plaintext and key, which the racing-session equality rule relies
/// on. The plaintext itself never leaves the client.
pub fn sign_result(signer: &PrivateKeySigner, value: u64) -> Result<String, CoordinatorError> {
    let signature = signer
        .sign_hash_sync(&result_digest(value))
        .map_err(|e| CoordinatorError::Signer(e.to_string()))?;
    Ok(format!("0x{}", hex::encode(signature.as_bytes())))
}
