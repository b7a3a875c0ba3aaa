// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per gas tank address whitelist.
//!
//! Mutations take the write lock, persist the new member list and only then
//! change the in-memory set, so concurrent mutations on one tank apply one
//! at a time and a failed store write leaves membership unchanged.

use std::collections::BTreeSet;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::RwLock;

use crate::error::GatewayError;
use crate::storage::ProjectStore;

pub struct WhitelistManager {
    tenant_id: String,
    chain_id: u64,
    members: RwLock<BTreeSet<Address>>,
    store: Arc<dyn ProjectStore>,
}

impl WhitelistManager {
    pub fn new(
        tenant_id: impl Into<String>,
        chain_id: u64,
        members: impl IntoIterator<Item = Address>,
        store: Arc<dyn ProjectStore>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            chain_id,
            members: RwLock::new(members.into_iter().collect()),
            store,
        }
    }

    /// Add `address`. Returns `false` if it was already a member.
    pub async fn add(&self, address: Address) -> Result<bool, GatewayError> {
        let mut members = self.members.write().await;
        if members.contains(&address) {
            return Ok(false);
        }

        let mut next: Vec<Address> = members.iter().copied().collect();
        next.push(address);
        next.sort();
        self.store
            .save_whitelist(&self.tenant_id, self.chain_id, next)
            .await?;
        members.insert(address);

        tracing::info!(
            tenant_id = %self.tenant_id,
            chain_id = self.chain_id,
            address = %address,
            "Address added to whitelist"
        );
        Ok(true)
    }

    /// Remove `address`. Returns `false` if it was not a member.
    pub async fn remove(&self, address: Address) -> Result<bool, GatewayError> {
        let mut members = self.members.write().await;
        if !members.contains(&address) {
            return Ok(false);
        }

        let next: Vec<Address> = members
            .iter()
            .copied()
            .filter(|member| *member != address)
            .collect();
        self.store
            .save_whitelist(&self.tenant_id, self.chain_id, next)
            .await?;
        members.remove(&address);

        tracing::info!(
            tenant_id = %self.tenant_id,
            chain_id = self.chain_id,
            address = %address,
            "Address removed from whitelist"
        );
        Ok(true)
    }

    pub async fn contains(&self, address: Address) -> bool {
        self.members.read().await.contains(&address)
    }

    pub async fn members(&self) -> Vec<Address> {
        self.members.read().await.iter().copied().collect()
    }
}
