// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas tanks and the per-project registry that loads them.
//!
//! A [`GasTank`] is materialized from its store record on first access and
//! then shared by every request for the same `(project, chain)`. The relayer
//! connection is attached lazily on top of that, once per tank.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::auth::nonce::NonceStore;
use crate::blockchain::ChainRef;
use crate::error::GatewayError;
use crate::registry::single_flight::SingleFlight;
use crate::registry::whitelist::WhitelistManager;
use crate::relay::engine::{RelayTarget, Relayer, TransactionEngine};
use crate::storage::{GasTankRecord, ProjectStore};

/// A loaded gas tank.
pub struct GasTank {
    tenant_id: String,
    chain_id: u64,
    provider_url: RwLock<String>,
    whitelist: WhitelistManager,
    nonces: NonceStore,
    engine: Arc<dyn TransactionEngine>,
    relayer: SingleFlight<(), Arc<dyn Relayer>, GatewayError>,
}

impl GasTank {
    fn from_record(
        tenant_id: &str,
        record: GasTankRecord,
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn TransactionEngine>,
        nonce_ttl: Duration,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            chain_id: record.chain_id,
            provider_url: RwLock::new(record.provider_url),
            whitelist: WhitelistManager::new(tenant_id, record.chain_id, record.whitelist, store),
            nonces: NonceStore::new(nonce_ttl),
            engine,
            relayer: SingleFlight::new(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn provider_url(&self) -> String {
        self.provider_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn whitelist(&self) -> &WhitelistManager {
        &self.whitelist
    }

    pub fn nonces(&self) -> &NonceStore {
        &self.nonces
    }

    /// Relayer for this tank, connecting on first use.
    pub async fn relayer(&self) -> Result<Arc<dyn Relayer>, GatewayError> {
        // The target is built when a load actually starts, under the
        // single-flight lock, so a provider change always reaches a loader.
        self.relayer
            .get_or_load((), || {
                let engine = Arc::clone(&self.engine);
                let target = RelayTarget {
                    project_id: self.tenant_id.clone(),
                    chain_id: self.chain_id,
                    provider_url: self.provider_url(),
                };
                async move { engine.connect(&target).await.map_err(GatewayError::from) }
            })
            .await
    }

    pub fn has_relayer(&self) -> bool {
        self.relayer.peek(&()).is_some()
    }

    /// Point the tank at a new provider; the next relay call reconnects.
    fn set_provider_url(&self, url: &str) {
        *self
            .provider_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = url.to_string();
        self.relayer.invalidate(&());
    }
}

/// Gas tanks of one project, keyed by chain ID.
pub struct ResourceRegistry {
    tenant_id: String,
    store: Arc<dyn ProjectStore>,
    engine: Arc<dyn TransactionEngine>,
    nonce_ttl: Duration,
    tanks: SingleFlight<u64, Arc<GasTank>, GatewayError>,
}

impl ResourceRegistry {
    pub fn new(
        tenant_id: impl Into<String>,
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn TransactionEngine>,
        nonce_ttl: Duration,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            store,
            engine,
            nonce_ttl,
            tanks: SingleFlight::new(),
        }
    }

    fn not_found(&self, chain: &ChainRef) -> GatewayError {
        GatewayError::GasTankNotFound {
            tenant_id: self.tenant_id.clone(),
            chain: chain.to_string(),
        }
    }

    /// Resolve and load the gas tank for `chain`.
    ///
    /// Concurrent first calls share one load. With `with_side_effects` the
    /// relayer is connected before returning.
    pub async fn load_and_get(
        &self,
        chain: &ChainRef,
        with_side_effects: bool,
    ) -> Result<Arc<GasTank>, GatewayError> {
        let chain_id = chain.resolve().ok_or_else(|| self.not_found(chain))?;

        if let Some(tank) = self.tanks.peek(&chain_id) {
            tracing::debug!(tenant_id = %self.tenant_id, chain_id, "Gas tank cache hit");
            if with_side_effects {
                tank.relayer().await?;
            }
            return Ok(tank);
        }

        let tenant_id = self.tenant_id.clone();
        let store = Arc::clone(&self.store);
        let engine = Arc::clone(&self.engine);
        let nonce_ttl = self.nonce_ttl;
        let tank = self
            .tanks
            .get_or_load(chain_id, move || async move {
                let record = store
                    .load_gas_tank(&tenant_id, chain_id)
                    .await?
                    .ok_or_else(|| GatewayError::GasTankNotFound {
                        tenant_id: tenant_id.clone(),
                        chain: chain_id.to_string(),
                    })?;

                tracing::info!(tenant_id = %tenant_id, chain_id, "Gas tank loaded");
                Ok::<_, GatewayError>(Arc::new(GasTank::from_record(
                    &tenant_id, record, store, engine, nonce_ttl,
                )))
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(tenant_id = %self.tenant_id, chain_id, error = %e, "Gas tank load failed");
            })?;

        if with_side_effects {
            tank.relayer().await?;
        }
        Ok(tank)
    }

    /// Drop the cached tank; the next access reloads it from the store.
    pub fn refresh(&self, chain_id: u64) {
        self.tanks.invalidate(&chain_id);
    }

    /// Provision a new gas tank for this project.
    pub async fn add_gas_tank(&self, record: GasTankRecord) -> Result<GasTankRecord, GatewayError> {
        if ChainRef::Id(record.chain_id).resolve().is_none() {
            return Err(GatewayError::UnsupportedChain(record.chain_id.to_string()));
        }

        let mut record = record;
        record.whitelist.sort();
        record.whitelist.dedup();
        self.store
            .insert_gas_tank(&self.tenant_id, record.clone())
            .await?;
        // A failed lookup before provisioning may be cached.
        self.tanks.invalidate(&record.chain_id);

        tracing::info!(
            tenant_id = %self.tenant_id,
            chain_id = record.chain_id,
            whitelist = record.whitelist.len(),
            "Gas tank added"
        );
        Ok(record)
    }

    /// Change the provider URL of an existing tank and reset its relayer.
    pub async fn update_provider(&self, chain_id: u64, provider_url: &str) -> Result<(), GatewayError> {
        self.store
            .update_gas_tank_provider(&self.tenant_id, chain_id, provider_url)
            .await?;
        if let Some(tank) = self.tanks.peek(&chain_id) {
            tank.set_provider_url(provider_url);
        }

        tracing::info!(tenant_id = %self.tenant_id, chain_id, "Gas tank provider updated");
        Ok(())
    }

    /// Persisted records of every gas tank of this project.
    pub async fn list(&self) -> Result<Vec<GasTankRecord>, GatewayError> {
        let project = self
            .store
            .load_project(&self.tenant_id)
            .await?
            .ok_or_else(|| GatewayError::TenantNotFound(self.tenant_id.clone()))?;
        Ok(project.gas_tanks)
    }

    /// Gas tanks that are currently loaded.
    pub fn loaded(&self) -> Vec<Arc<GasTank>> {
        self.tanks.ready_values()
    }
}
