// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! secp256k1 signer recovery.
//!
//! Wallet clients sign the issued nonce directly as a 32-byte digest, so a
//! message that decodes to exactly 32 bytes is recovered from the prehash.
//! Any other message is treated as an EIP-191 personal message.

use alloy::primitives::{Address, Signature, B256};

/// Length of a `0x`-prefixed 32-byte hex digest.
const DIGEST_HEX_LEN: usize = 66;

/// Errors returned by [`SignatureVerifier::recover_address`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not valid hex: {0}")]
    InvalidHex(String),

    #[error("signature must be 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("signature could not be parsed: {0}")]
    Malformed(String),

    #[error("signer recovery failed: {0}")]
    Recovery(String),
}

/// Stateless signer recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Recover the address that produced `signature` over `message`.
    pub fn recover_address(&self, message: &str, signature: &str) -> Result<Address, SignatureError> {
        let signature = parse_signature(signature)?;

        match as_digest(message) {
            Some(digest) => signature
                .recover_address_from_prehash(&digest)
                .map_err(|e| SignatureError::Recovery(e.to_string())),
            None => signature
                .recover_address_from_msg(message.as_bytes())
                .map_err(|e| SignatureError::Recovery(e.to_string())),
        }
    }
}

fn parse_signature(raw: &str) -> Result<Signature, SignatureError> {
    let bytes = alloy::hex::decode(raw.trim())
        .map_err(|e| SignatureError::InvalidHex(e.to_string()))?;
    if bytes.len() != 65 {
        return Err(SignatureError::InvalidLength(bytes.len()));
    }
    Signature::from_raw(&bytes).map_err(|e| SignatureError::Malformed(e.to_string()))
}

fn as_digest(message: &str) -> Option<B256> {
    if message.len() != DIGEST_HEX_LEN || !message.starts_with("0x") {
        return None;
    }
    let bytes = alloy::hex::decode(message).ok()?;
    (bytes.len() == 32).then(|| B256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    fn signer() -> PrivateKeySigner {
        PrivateKeySigner::from_slice(&[0x42; 32]).unwrap()
    }

    #[test]
    fn recovers_digest_signer() {
        let signer = signer();
        let digest = B256::repeat_byte(0x11);
        let sig = signer.sign_hash_sync(&digest).unwrap();

        let recovered = SignatureVerifier::new()
            .recover_address(
                &alloy::hex::encode_prefixed(digest),
                &alloy::hex::encode_prefixed(sig.as_bytes()),
            )
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn recovers_personal_message_signer() {
        let signer = signer();
        let sig = signer.sign_message_sync(b"hello gateway").unwrap();

        let recovered = SignatureVerifier::new()
            .recover_address(
                "hello gateway",
                &alloy::hex::encode_prefixed(sig.as_bytes()),
            )
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn recovery_is_deterministic() {
        let signer = signer();
        let digest = B256::repeat_byte(0x22);
        let sig = alloy::hex::encode_prefixed(signer.sign_hash_sync(&digest).unwrap().as_bytes());
        let verifier = SignatureVerifier::new();

        let first = verifier.recover_address(&alloy::hex::encode_prefixed(digest), &sig).unwrap();
        let second = verifier.recover_address(&alloy::hex::encode_prefixed(digest), &sig).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_malformed_signatures() {
        let verifier = SignatureVerifier::new();
        assert!(matches!(
            verifier.recover_address("msg", "0xzz"),
            Err(SignatureError::InvalidHex(_))
        ));
        assert!(matches!(
            verifier.recover_address("msg", "0x1234"),
            Err(SignatureError::InvalidLength(2))
        ));
    }
}
