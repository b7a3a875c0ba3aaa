// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the collaborator traits.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use async_trait::async_trait;
use serde_json::json;

use crate::blockchain::{ChainReadError, ChainReader};
use crate::models::WebHookAttributes;
use crate::relay::engine::{
    BuildRequest, DeployRequest, PreparedTransaction, ProxyWallet, RelayError, RelayTarget,
    Relayer, SendRequest, TransactionEngine,
};

/// Deterministic smart contract wallet for an owner.
pub fn scw_for(owner: Address) -> Address {
    let mut bytes = owner.into_array();
    bytes[0] ^= 0xff;
    Address::from(bytes)
}

#[derive(Default)]
struct EngineLog {
    connections: usize,
    fail_connect: bool,
    reject_with: Option<String>,
    targets: Vec<RelayTarget>,
    builds: Vec<BuildRequest>,
    sends: Vec<SendRequest>,
    deploys: Vec<DeployRequest>,
}

/// In-process transaction engine that records every call.
#[derive(Default, Clone)]
pub struct MockEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl MockEngine {
    pub fn connections(&self) -> usize {
        self.log.lock().unwrap().connections
    }

    pub fn fail_connect(&self, fail: bool) {
        self.log.lock().unwrap().fail_connect = fail;
    }

    /// Make every relayer call fail with `message`.
    pub fn reject_with(&self, message: &str) {
        self.log.lock().unwrap().reject_with = Some(message.to_string());
    }

    pub fn last_target(&self) -> Option<RelayTarget> {
        self.log.lock().unwrap().targets.last().cloned()
    }

    /// Every connection target, in connection order.
    pub fn targets(&self) -> Vec<RelayTarget> {
        self.log.lock().unwrap().targets.clone()
    }

    pub fn builds(&self) -> Vec<BuildRequest> {
        self.log.lock().unwrap().builds.clone()
    }

    pub fn sends(&self) -> Vec<SendRequest> {
        self.log.lock().unwrap().sends.clone()
    }

    pub fn deploys(&self) -> Vec<DeployRequest> {
        self.log.lock().unwrap().deploys.clone()
    }
}

#[async_trait]
impl TransactionEngine for MockEngine {
    async fn connect(&self, target: &RelayTarget) -> Result<Arc<dyn Relayer>, RelayError> {
        // Widen the window for concurrent first calls.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut log = self.log.lock().unwrap();
        log.connections += 1;
        log.targets.push(target.clone());
        if log.fail_connect {
            return Err(RelayError::Request("connection refused".into()));
        }
        Ok(Arc::new(MockRelayer {
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockRelayer {
    log: Arc<Mutex<EngineLog>>,
}

impl MockRelayer {
    fn rejection(&self) -> Result<(), RelayError> {
        match &self.log.lock().unwrap().reject_with {
            Some(message) => Err(RelayError::Rejected {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Relayer for MockRelayer {
    async fn build_transaction(
        &self,
        request: BuildRequest,
    ) -> Result<PreparedTransaction, RelayError> {
        self.rejection()?;
        let prepared = PreparedTransaction {
            safe_tx_body: json!({
                "to": request.target_contract_address,
                "data": request.populated_tx,
            }),
            scw_address: scw_for(request.zero_wallet_address),
        };
        self.log.lock().unwrap().builds.push(request);
        Ok(prepared)
    }

    async fn send_gasless_transaction(&self, request: SendRequest) -> Result<String, RelayError> {
        self.rejection()?;
        self.log.lock().unwrap().sends.push(request);
        Ok(format!("{:#x}", B256::repeat_byte(0x77)))
    }

    async fn deploy_proxy_wallet(&self, request: DeployRequest) -> Result<Address, RelayError> {
        self.rejection()?;
        let scw = scw_for(request.zero_wallet_address);
        self.log.lock().unwrap().deploys.push(request);
        Ok(scw)
    }

    async fn does_proxy_wallet_exist(&self, owner: Address) -> Result<ProxyWallet, RelayError> {
        self.rejection()?;
        Ok(ProxyWallet {
            wallet_address: scw_for(owner),
            is_deployed: true,
        })
    }
}

/// Chain reader backed by a fixed `contract -> owner` map.
#[derive(Default)]
pub struct MockChainReader {
    owners: Mutex<HashMap<Address, Address>>,
    unreachable: Mutex<bool>,
}

impl MockChainReader {
    pub fn set_owner(&self, contract: Address, owner: Address) {
        self.owners.lock().unwrap().insert(contract, owner);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn contract_owner(
        &self,
        chain_id: u64,
        contract: Address,
    ) -> Result<Address, ChainReadError> {
        if *self.unreachable.lock().unwrap() {
            return Err(ChainReadError::UnknownChain(chain_id));
        }
        self.owners
            .lock()
            .unwrap()
            .get(&contract)
            .copied()
            .ok_or_else(|| ChainReadError::ContractError("execution reverted".into()))
    }
}

/// Wallet that signs nonces the way wallet clients do.
pub struct TestWallet {
    signer: PrivateKeySigner,
}

impl TestWallet {
    pub fn new(seed: u8) -> Self {
        Self {
            signer: PrivateKeySigner::from_slice(&[seed; 32]).unwrap(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn sign_nonce(&self, nonce: &str) -> String {
        let digest: B256 = nonce.parse().unwrap();
        let signature = self.signer.sign_hash_sync(&digest).unwrap();
        alloy::hex::encode_prefixed(signature.as_bytes())
    }

    pub fn hook(&self, nonce: &str) -> WebHookAttributes {
        WebHookAttributes {
            nonce: nonce.to_string(),
            signed_nonce: self.sign_nonce(nonce),
            to: None,
            extra: Default::default(),
        }
    }
}
