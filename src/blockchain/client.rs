// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only EVM client used by the access control chain.

use std::collections::HashMap;
use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, ProviderBuilder, RootProvider,
    },
};
use async_trait::async_trait;

use super::ownable::OwnableContract;
use super::types::ChainTable;

/// HTTP provider type for EVM chains (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Contract view calls needed by the authorization pipeline.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Return `owner()` of the contract at `contract` on `chain_id`.
    async fn contract_owner(&self, chain_id: u64, contract: Address)
        -> Result<Address, ChainReadError>;
}

/// Alloy-backed [`ChainReader`] with one HTTP provider per configured chain.
pub struct EvmChainReader {
    providers: HashMap<u64, HttpProvider>,
    timeout: Duration,
}

impl EvmChainReader {
    /// Create providers for every chain in the table.
    pub fn new(chains: &ChainTable, timeout: Duration) -> Self {
        let providers = chains
            .iter()
            .map(|chain| {
                let provider = ProviderBuilder::new().connect_http(chain.provider_url.clone());
                (chain.chain_id, provider)
            })
            .collect();

        Self { providers, timeout }
    }
}

#[async_trait]
impl ChainReader for EvmChainReader {
    async fn contract_owner(
        &self,
        chain_id: u64,
        contract: Address,
    ) -> Result<Address, ChainReadError> {
        let provider = self
            .providers
            .get(&chain_id)
            .ok_or(ChainReadError::UnknownChain(chain_id))?;

        let ownable = OwnableContract::new(provider, contract);
        tokio::time::timeout(self.timeout, ownable.owner())
            .await
            .map_err(|_| ChainReadError::Timeout(self.timeout))?
    }
}

/// Errors that can occur during chain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainReadError {
    #[error("No provider configured for chain {0}")]
    UnknownChain(u64),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Chain read timed out after {0:?}")]
    Timeout(Duration),
}
