// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Projects (tenants) and the root registry.
//!
//! Every project is loaded at most once and shared as an `Arc<Tenant>`;
//! looking it up by id or by API key yields the same instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use alloy::primitives::Address;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::registry::gas_tank::ResourceRegistry;
use crate::registry::single_flight::SingleFlight;
use crate::relay::engine::TransactionEngine;
use crate::storage::{ProjectRecord, ProjectStore, ProjectUpdate};

/// How a request addresses a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantRef {
    Id(String),
    ApiKey(String),
}

/// A loaded project.
pub struct Tenant {
    id: String,
    api_key: String,
    owner: Address,
    name: RwLock<String>,
    allowed_origins: RwLock<Vec<String>>,
    gas_tanks: ResourceRegistry,
}

impl Tenant {
    fn from_record(
        record: ProjectRecord,
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn TransactionEngine>,
        nonce_ttl: Duration,
    ) -> Self {
        Self {
            gas_tanks: ResourceRegistry::new(record.id.clone(), store, engine, nonce_ttl),
            id: record.id,
            api_key: record.api_key,
            owner: record.owner,
            name: RwLock::new(record.name),
            allowed_origins: RwLock::new(record.allowed_origins),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Smart contract wallet that owns this project.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn name(&self) -> String {
        self.name.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn gas_tanks(&self) -> &ResourceRegistry {
        &self.gas_tanks
    }

    fn apply(&self, record: &ProjectRecord) {
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = record.name.clone();
        *self
            .allowed_origins
            .write()
            .unwrap_or_else(PoisonError::into_inner) = record.allowed_origins.clone();
    }
}

/// Fields of a project being provisioned.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub owner: Address,
    pub allowed_origins: Vec<String>,
}

/// Root registry of loaded projects.
pub struct TenantRegistry {
    store: Arc<dyn ProjectStore>,
    engine: Arc<dyn TransactionEngine>,
    nonce_ttl: Duration,
    tenants: SingleFlight<String, Arc<Tenant>, GatewayError>,
    api_keys: Mutex<HashMap<String, String>>,
}

impl TenantRegistry {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn TransactionEngine>,
        nonce_ttl: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            nonce_ttl,
            tenants: SingleFlight::new(),
            api_keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    pub async fn resolve(&self, tenant: &TenantRef) -> Result<Arc<Tenant>, GatewayError> {
        match tenant {
            TenantRef::Id(id) => self.get_by_id(id).await,
            TenantRef::ApiKey(key) => self.get_by_api_key(key).await,
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Arc<Tenant>, GatewayError> {
        if let Some(tenant) = self.tenants.peek(&id.to_string()) {
            tracing::debug!(tenant_id = %id, "Project cache hit");
            return Ok(tenant);
        }

        let project_id = id.to_string();
        let store = Arc::clone(&self.store);
        let engine = Arc::clone(&self.engine);
        let nonce_ttl = self.nonce_ttl;
        let tenant = self
            .tenants
            .get_or_load(project_id.clone(), move || async move {
                let record = store
                    .load_project(&project_id)
                    .await?
                    .ok_or_else(|| GatewayError::TenantNotFound(project_id.clone()))?;

                tracing::info!(tenant_id = %record.id, "Project loaded");
                Ok::<_, GatewayError>(Arc::new(Tenant::from_record(
                    record, store, engine, nonce_ttl,
                )))
            })
            .await?;

        self.api_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tenant.api_key.clone(), tenant.id.clone());
        Ok(tenant)
    }

    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Arc<Tenant>, GatewayError> {
        let cached = self
            .api_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(api_key)
            .cloned();

        let id = match cached {
            Some(id) => id,
            None => self
                .store
                .find_project_id(api_key)
                .await?
                .ok_or_else(|| GatewayError::TenantNotFound(api_key.to_string()))?,
        };
        self.get_by_id(&id).await
    }

    /// Raw records of every project owned by `owner`.
    pub async fn list_by_owner(&self, owner: Address) -> Result<Vec<ProjectRecord>, GatewayError> {
        Ok(self.store.list_projects_by_owner(owner).await?)
    }

    /// Provision a project with a fresh id and API key.
    pub async fn create(&self, project: NewProject) -> Result<ProjectRecord, GatewayError> {
        let record = ProjectRecord {
            id: Uuid::new_v4().to_string(),
            api_key: Uuid::new_v4().simple().to_string(),
            name: project.name,
            owner: project.owner,
            allowed_origins: project.allowed_origins,
            gas_tanks: Vec::new(),
        };
        self.store.insert_project(record.clone()).await?;

        tracing::info!(tenant_id = %record.id, owner = %record.owner, "Project created");
        Ok(record)
    }

    /// Update name and allowed origins; a loaded tenant sees the change at once.
    pub async fn update(&self, id: &str, update: ProjectUpdate) -> Result<ProjectRecord, GatewayError> {
        let record = self.store.update_project(id, update).await?;
        if let Some(tenant) = self.tenants.peek(&id.to_string()) {
            tenant.apply(&record);
        }

        tracing::info!(tenant_id = %id, "Project updated");
        Ok(record)
    }

    /// Forget a loaded project; the next lookup reloads it from the store.
    pub fn evict(&self, id: &str) {
        self.tenants.invalidate(&id.to_string());
        self.api_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, project_id| project_id != id);
    }

    /// Projects that are currently loaded.
    pub fn loaded(&self) -> Vec<Arc<Tenant>> {
        self.tenants.ready_values()
    }
}
