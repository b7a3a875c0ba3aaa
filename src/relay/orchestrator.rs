// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless operations, forwarded to the relayer of the target gas tank.
//!
//! Callers run the access control chain first; the orchestrator only
//! resolves the tank (connecting its relayer) and delegates. Engine errors
//! are not retried.

use alloy::primitives::Address;
use serde_json::Value;
use tracing::info;

use crate::blockchain::ChainRef;
use crate::error::GatewayError;
use crate::models::WebHookAttributes;
use crate::registry::ResourceRegistry;
use crate::relay::engine::{BuildRequest, DeployRequest, PreparedTransaction, SendRequest};

#[derive(Debug, Clone, Copy, Default)]
pub struct RelayOrchestrator;

impl RelayOrchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Prepare a Safe transaction wrapping `data` for `owner`'s wallet.
    pub async fn build(
        &self,
        gas_tanks: &ResourceRegistry,
        chain: &ChainRef,
        owner: Address,
        data: String,
        hook: WebHookAttributes,
    ) -> Result<PreparedTransaction, GatewayError> {
        let tank = gas_tanks.load_and_get(chain, true).await?;
        let relayer = tank.relayer().await?;

        let prepared = relayer
            .build_transaction(BuildRequest {
                zero_wallet_address: owner,
                populated_tx: data,
                target_contract_address: hook.to.clone(),
                web_hook_attributes: hook,
            })
            .await?;

        info!(
            tenant_id = %tank.tenant_id(),
            chain_id = tank.chain_id(),
            address = %owner,
            "Gasless transaction built"
        );
        Ok(prepared)
    }

    /// Submit a signed transaction. Returns the transaction hash.
    pub async fn send(
        &self,
        gas_tanks: &ResourceRegistry,
        chain: &ChainRef,
        owner: Address,
        safe_tx_body: Value,
        signature: String,
        hook: WebHookAttributes,
    ) -> Result<String, GatewayError> {
        let tank = gas_tanks.load_and_get(chain, true).await?;
        let relayer = tank.relayer().await?;

        let wallet = relayer.does_proxy_wallet_exist(owner).await?;
        let tx_hash = relayer
            .send_gasless_transaction(SendRequest {
                safe_tx_body,
                zero_wallet_address: owner,
                scw_address: wallet.wallet_address,
                signature,
                web_hook_attributes: hook,
            })
            .await?;

        info!(
            tenant_id = %tank.tenant_id(),
            chain_id = tank.chain_id(),
            address = %owner,
            tx_hash = %tx_hash,
            "Gasless transaction sent"
        );
        Ok(tx_hash)
    }

    /// Deploy `owner`'s proxy wallet. Returns the wallet address.
    pub async fn deploy(
        &self,
        gas_tanks: &ResourceRegistry,
        chain: &ChainRef,
        owner: Address,
        hook: WebHookAttributes,
    ) -> Result<Address, GatewayError> {
        let tank = gas_tanks.load_and_get(chain, true).await?;
        let relayer = tank.relayer().await?;

        let scw = relayer
            .deploy_proxy_wallet(DeployRequest {
                zero_wallet_address: owner,
                web_hook_attributes: hook,
            })
            .await?;

        info!(
            tenant_id = %tank.tenant_id(),
            chain_id = tank.chain_id(),
            address = %owner,
            scw_address = %scw,
            "Proxy wallet deployed"
        );
        Ok(scw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::storage::{GasTankRecord, InMemoryStore};
    use crate::testing::{scw_for, MockEngine};

    fn registry(engine: &MockEngine) -> ResourceRegistry {
        let store = InMemoryStore::with_projects(vec![crate::storage::ProjectRecord {
            id: "p1".into(),
            api_key: "k1".into(),
            name: "Demo".into(),
            owner: Address::ZERO,
            allowed_origins: vec![],
            gas_tanks: vec![GasTankRecord {
                chain_id: 137,
                provider_url: "https://polygon.example".into(),
                whitelist: vec![],
            }],
        }])
        .unwrap();
        ResourceRegistry::new(
            "p1",
            Arc::new(store),
            Arc::new(engine.clone()),
            Duration::from_secs(60),
        )
    }

    fn hook() -> WebHookAttributes {
        WebHookAttributes {
            nonce: "0x01".into(),
            signed_nonce: "0x02".into(),
            to: Some("0x03".into()),
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn build_forwards_target_contract_and_connects_once() {
        let engine = MockEngine::default();
        let tanks = registry(&engine);
        let owner = Address::repeat_byte(0xaa);
        let orchestrator = RelayOrchestrator::new();

        let prepared = orchestrator
            .build(&tanks, &ChainRef::Name("polygon".into()), owner, "0xdead".into(), hook())
            .await
            .unwrap();
        orchestrator
            .build(&tanks, &ChainRef::Id(137), owner, "0xbeef".into(), hook())
            .await
            .unwrap();

        assert_eq!(prepared.scw_address, scw_for(owner));
        assert_eq!(engine.connections(), 1);
        assert_eq!(
            engine.last_target().unwrap().provider_url,
            "https://polygon.example"
        );
        let builds = engine.builds();
        assert_eq!(builds[0].target_contract_address.as_deref(), Some("0x03"));
        assert_eq!(builds[1].populated_tx, "0xbeef");
    }

    #[tokio::test]
    async fn send_resolves_wallet_before_submitting() {
        let engine = MockEngine::default();
        let tanks = registry(&engine);
        let owner = Address::repeat_byte(0xbb);

        let tx_hash = RelayOrchestrator::new()
            .send(&tanks, &ChainRef::Id(137), owner, json!({"to": "0x03"}), "0xsig".into(), hook())
            .await
            .unwrap();

        assert!(tx_hash.starts_with("0x77"));
        let sends = engine.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].scw_address, scw_for(owner));
        assert_eq!(sends[0].signature, "0xsig");
    }

    #[tokio::test]
    async fn deploy_returns_wallet_address() {
        let engine = MockEngine::default();
        let tanks = registry(&engine);
        let owner = Address::repeat_byte(0xcc);

        let scw = RelayOrchestrator::new()
            .deploy(&tanks, &ChainRef::Id(137), owner, hook())
            .await
            .unwrap();

        assert_eq!(scw, scw_for(owner));
        assert_eq!(engine.deploys().len(), 1);
    }

    #[tokio::test]
    async fn engine_rejection_is_a_relay_failure() {
        let engine = MockEngine::default();
        engine.reject_with("insufficient funds in gas tank");
        let tanks = registry(&engine);

        let err = RelayOrchestrator::new()
            .deploy(&tanks, &ChainRef::Id(137), Address::repeat_byte(0xcc), hook())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::RelayFailure(msg) if msg == "insufficient funds in gas tank"
        ));
    }

    #[tokio::test]
    async fn unknown_chain_is_gas_tank_not_found() {
        let engine = MockEngine::default();
        let tanks = registry(&engine);

        let err = RelayOrchestrator::new()
            .deploy(&tanks, &ChainRef::Id(5), Address::repeat_byte(0xcc), hook())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::GasTankNotFound { .. }));
        assert_eq!(engine.connections(), 0);
    }
}
