// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nonce sessions for one gas tank.
//!
//! Each address holds at most one [`AuthSession`]. Issuing or refreshing
//! replaces it; expiry is checked lazily on read. Every operation for an
//! address runs under that address' own async mutex, so an `authorize` and a
//! `refresh` for the same wallet cannot interleave while distinct addresses
//! never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GatewayError;

/// Default session lifetime (1 hour).
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(3600);

/// A live challenge bound to one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub address: Address,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    fn new(address: Address, ttl: Duration) -> Self {
        let issued_at = Utc::now();
        // Keep expires_at strictly after issued_at even for a zero TTL.
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or(chrono::Duration::MAX)
            .max(chrono::Duration::milliseconds(1));
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            address,
            nonce: generate_nonce(),
            issued_at,
            expires_at,
        }
    }

    pub fn is_live(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Proof that an address signed its current nonce.
///
/// Only the nonce-authentication stage of the access control chain builds
/// one; [`NonceStore::refresh`] requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    address: Address,
    nonce: String,
}

impl Authenticated {
    pub(crate) fn new(address: Address, nonce: impl Into<String>) -> Self {
        Self {
            address,
            nonce: nonce.into(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

type SessionSlot = Arc<tokio::sync::Mutex<Option<AuthSession>>>;

/// Per gas tank session table.
pub struct NonceStore {
    ttl: Duration,
    sessions: Mutex<HashMap<Address, SessionSlot>>,
}

impl NonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, address: Address) -> SessionSlot {
        // The map lock is only held to clone the slot handle.
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(address).or_default())
    }

    /// Slot of `address` without creating one; reads never grow the table.
    fn existing_slot(&self, address: Address) -> Option<SessionSlot> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&address)
            .cloned()
    }

    /// Issue a fresh nonce for `address`, discarding any previous session.
    pub async fn issue(&self, address: Address) -> String {
        let slot = self.slot(address);
        let mut session = slot.lock().await;
        let fresh = AuthSession::new(address, self.ttl);
        let nonce = fresh.nonce.clone();
        *session = Some(fresh);
        nonce
    }

    /// Return the live nonce for `address`, or `None` once it has expired.
    pub async fn verify(&self, address: Address) -> Option<String> {
        self.session(address).await.map(|session| session.nonce)
    }

    /// Return the live session for `address`.
    pub async fn session(&self, address: Address) -> Option<AuthSession> {
        let slot = self.existing_slot(address)?;
        let mut session = slot.lock().await;
        match session.as_ref() {
            Some(current) if current.is_live() => Some(current.clone()),
            Some(_) => {
                *session = None;
                None
            }
            None => None,
        }
    }

    /// Rotate the nonce of an authenticated address.
    ///
    /// Fails with `Unauthorized` if the session was replaced or expired
    /// between authentication and rotation.
    pub async fn refresh(&self, proof: &Authenticated) -> Result<String, GatewayError> {
        let slot = self
            .existing_slot(proof.address)
            .ok_or(GatewayError::Unauthorized)?;
        let mut session = slot.lock().await;

        let still_current = session
            .as_ref()
            .is_some_and(|current| current.is_live() && current.nonce == proof.nonce);
        if !still_current {
            return Err(GatewayError::Unauthorized);
        }

        let fresh = AuthSession::new(proof.address, self.ttl);
        let nonce = fresh.nonce.clone();
        *session = Some(fresh);
        Ok(nonce)
    }

    /// Drop idle slots whose session is absent or expired.
    ///
    /// A slot is only removed while the map is its sole owner, so an
    /// operation that already cloned the handle never writes into a slot
    /// that has left the table.
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(session) => session.as_ref().is_some_and(AuthSession::is_live),
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    /// Number of addresses with a slot, live or not.
    pub fn tracked(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL)
    }
}

/// 32 random bytes as `0x`-prefixed hex, so clients can sign it as a digest.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    alloy::hex::encode_prefixed(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[tokio::test]
    async fn issue_then_verify_returns_same_nonce() {
        let store = NonceStore::default();
        let nonce = store.issue(addr(0xaa)).await;

        assert_eq!(store.verify(addr(0xaa)).await, Some(nonce));
    }

    #[tokio::test]
    async fn nonce_is_digest_shaped() {
        let store = NonceStore::default();
        let nonce = store.issue(addr(0xaa)).await;

        assert_eq!(nonce.len(), 66);
        assert!(nonce.starts_with("0x"));
    }

    #[tokio::test]
    async fn verify_reports_expiry_after_ttl() {
        let store = NonceStore::new(Duration::from_millis(20));
        store.issue(addr(0xaa)).await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.verify(addr(0xaa)).await, None);
    }

    #[tokio::test]
    async fn verify_does_not_consume() {
        let store = NonceStore::default();
        let nonce = store.issue(addr(0xaa)).await;

        assert_eq!(store.verify(addr(0xaa)).await, Some(nonce.clone()));
        assert_eq!(store.verify(addr(0xaa)).await, Some(nonce));
    }

    #[tokio::test]
    async fn issue_overwrites_previous_session() {
        let store = NonceStore::default();
        let first = store.issue(addr(0xaa)).await;
        let second = store.issue(addr(0xaa)).await;

        assert_ne!(first, second);
        assert_eq!(store.verify(addr(0xaa)).await, Some(second));
    }

    #[tokio::test]
    async fn refresh_invalidates_previous_nonce() {
        let store = NonceStore::default();
        let first = store.issue(addr(0xaa)).await;
        let proof = Authenticated::new(addr(0xaa), first.clone());

        let rotated = store.refresh(&proof).await.unwrap();
        assert_ne!(rotated, first);
        assert_eq!(store.verify(addr(0xaa)).await, Some(rotated));

        // The old proof no longer matches.
        assert!(matches!(
            store.refresh(&proof).await,
            Err(GatewayError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn refresh_requires_live_session() {
        let store = NonceStore::default();
        let proof = Authenticated::new(addr(0xbb), "0x00");

        assert!(matches!(
            store.refresh(&proof).await,
            Err(GatewayError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn reads_do_not_track_unknown_addresses() {
        let store = NonceStore::default();

        assert_eq!(store.verify(addr(0xcc)).await, None);
        assert_eq!(store.session(addr(0xdd)).await, None);
        assert!(store
            .refresh(&Authenticated::new(addr(0xee), "0x00"))
            .await
            .is_err());

        assert_eq!(store.tracked(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_of_one_nonce_rotate_once() {
        let store = Arc::new(NonceStore::default());
        let first = store.issue(addr(0xaa)).await;
        let proof = Authenticated::new(addr(0xaa), first);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let proof = proof.clone();
                tokio::spawn(async move { store.refresh(&proof).await })
            })
            .collect();

        let mut rotated = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(nonce) => rotated.push(nonce),
                Err(err) => assert!(matches!(err, GatewayError::Unauthorized)),
            }
        }

        assert_eq!(rotated.len(), 1);
        assert_eq!(store.verify(addr(0xaa)).await, rotated.pop());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_issue_and_refresh_leave_one_session() {
        let store = Arc::new(NonceStore::default());
        let first = store.issue(addr(0xaa)).await;
        let proof = Authenticated::new(addr(0xaa), first);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                let proof = proof.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        Some(store.issue(addr(0xaa)).await)
                    } else {
                        store.refresh(&proof).await.ok()
                    }
                })
            })
            .collect();

        let mut handed_out = Vec::new();
        for handle in handles {
            handed_out.extend(handle.await.unwrap());
        }

        assert_eq!(store.tracked(), 1);
        let current = store.verify(addr(0xaa)).await.unwrap();
        assert!(handed_out.contains(&current));

        // Only the surviving nonce authenticates a rotation.
        for stale in handed_out.iter().filter(|nonce| **nonce != current) {
            assert!(matches!(
                store.refresh(&Authenticated::new(addr(0xaa), stale.clone())).await,
                Err(GatewayError::Unauthorized)
            ));
        }
        assert!(store
            .refresh(&Authenticated::new(addr(0xaa), current))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_address() {
        let store = NonceStore::default();
        let a = store.issue(addr(0xaa)).await;
        let b = store.issue(addr(0xbb)).await;

        assert_eq!(store.verify(addr(0xaa)).await, Some(a));
        assert_eq!(store.verify(addr(0xbb)).await, Some(b));
        assert_eq!(store.verify(addr(0xcc)).await, None);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_sessions() {
        let store = NonceStore::new(Duration::from_millis(20));
        store.issue(addr(0xaa)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        let live = store.issue(addr(0xbb)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.tracked(), 1);
        assert_eq!(store.verify(addr(0xbb)).await, Some(live));
    }

    #[test]
    fn session_expiry_is_after_issue() {
        let session = AuthSession::new(addr(0xaa), Duration::ZERO);
        assert!(session.expires_at > session.issued_at);
    }
}
