// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `Ownable` view calls against smart contract wallets.

use alloy::{primitives::Address, providers::Provider, sol};

use super::client::ChainReadError;

// Smart contract wallets expose their controlling EOA through `owner()`.
sol! {
    #[sol(rpc)]
    interface IOwnable {
        function owner() external view returns (address);
    }
}

/// Ownable contract wrapper.
pub struct OwnableContract<P> {
    contract: IOwnable::IOwnableInstance<P>,
}

impl<P: Provider + Clone> OwnableContract<P> {
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IOwnable::new(address, provider.clone()),
        }
    }

    /// Read the current owner of the contract.
    pub async fn owner(&self) -> Result<Address, ChainReadError> {
        let owner: Address = self
            .contract
            .owner()
            .call()
            .await
            .map_err(|e| ChainReadError::ContractError(e.to_string()))?;
        Ok(owner)
    }
}
