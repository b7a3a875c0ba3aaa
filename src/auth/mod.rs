// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet holders and dashboard operators authenticate with signed nonces.
//!
//! ## Auth Flow
//!
//! 1. Client calls `authorize` for a gas tank and receives a nonce
//! 2. Wallet signs the nonce (32-byte digest, secp256k1)
//! 3. Client sends `webHookAttributes: { nonce, signedNonce }` with every
//!    privileged request
//! 4. Gateway:
//!    - checks the `Origin` header against the project's allow-list
//!    - recovers the signer and matches it against the live session
//!    - for dashboard calls, reads `owner()` of the claimed smart wallet
//!    - for relay calls, checks the gas tank whitelist
//!
//! ## Security
//!
//! - Sessions expire after `NONCE_TTL_SECS`; an expired nonce never verifies
//! - `refreshNonce` invalidates the previous nonce
//! - Denials never name the failing check

pub mod access;
pub mod extractor;
pub mod middleware;
pub mod nonce;
pub mod signature;

pub use access::{
    check_origin, AccessContext, AccessControlChain, AccessDecision, Denial, OperationCategory,
    Principal, Stage,
};
pub use extractor::RequestOrigin;
pub use nonce::{AuthSession, Authenticated, NonceStore};
pub use signature::{SignatureError, SignatureVerifier};
