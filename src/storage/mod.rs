// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Project Store
//!
//! Durable records behind the registries. The gateway only talks to the
//! [`ProjectStore`] trait; two implementations ship with the crate:
//!
//! - [`InMemoryStore`] - process-local maps, used in tests and when no
//!   projects file is configured
//! - [`JsonFileStore`] - the same maps, loaded from and written back to a
//!   single JSON document (`PROJECTS_FILE`)
//!
//! ## Document Layout
//!
//! ```text
//! {
//!   "projects": [
//!     {
//!       "id": "...", "apiKey": "...", "name": "...", "owner": "0x...",
//!       "allowedOrigins": ["https://app.example"],
//!       "gasTanks": [
//!         { "chainId": 5, "providerURL": "https://...", "whitelist": ["0x..."] }
//!       ]
//!     }
//!   ]
//! }
//! ```

pub mod json_file;
pub mod memory;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{FieldError, GatewayError};

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Persisted gas tank of one project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GasTankRecord {
    /// EIP-155 chain ID.
    pub chain_id: u64,
    /// Endpoint handed to the transaction engine for this tank.
    #[serde(rename = "providerURL")]
    pub provider_url: String,
    /// Addresses allowed to relay through this tank.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub whitelist: Vec<Address>,
}

/// Persisted project (tenant).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub api_key: String,
    pub name: String,
    /// Smart contract wallet that owns the project.
    #[schema(value_type = String)]
    pub owner: Address,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub gas_tanks: Vec<GasTankRecord>,
}

impl ProjectRecord {
    pub fn gas_tank(&self, chain_id: u64) -> Option<&GasTankRecord> {
        self.gas_tanks.iter().find(|tank| tank.chain_id == chain_id)
    }
}

/// Mutable project fields. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
}

/// Store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("gas tank {chain_id} not found in project '{project_id}'")]
    GasTankNotFound { project_id: String, chain_id: u64 },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProjectNotFound(id) => GatewayError::TenantNotFound(id),
            StoreError::GasTankNotFound {
                project_id,
                chain_id,
            } => GatewayError::GasTankNotFound {
                tenant_id: project_id,
                chain: chain_id.to_string(),
            },
            StoreError::AlreadyExists(what) => {
                GatewayError::Validation(vec![FieldError::new("chainId", format!("{what} already exists"))])
            }
            other => GatewayError::Store(other.to_string()),
        }
    }
}

/// Persistence seam for projects and their gas tanks.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn load_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>>;

    async fn find_project_id(&self, api_key: &str) -> StoreResult<Option<String>>;

    async fn list_projects_by_owner(&self, owner: Address) -> StoreResult<Vec<ProjectRecord>>;

    async fn insert_project(&self, record: ProjectRecord) -> StoreResult<()>;

    async fn update_project(&self, id: &str, update: ProjectUpdate) -> StoreResult<ProjectRecord>;

    async fn load_gas_tank(&self, project_id: &str, chain_id: u64)
        -> StoreResult<Option<GasTankRecord>>;

    async fn insert_gas_tank(&self, project_id: &str, record: GasTankRecord) -> StoreResult<()>;

    async fn update_gas_tank_provider(
        &self,
        project_id: &str,
        chain_id: u64,
        provider_url: &str,
    ) -> StoreResult<()>;

    async fn save_whitelist(
        &self,
        project_id: &str,
        chain_id: u64,
        whitelist: Vec<Address>,
    ) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_wire_field_names() {
        let json = r#"{
            "id": "p1",
            "apiKey": "key-1",
            "name": "Demo",
            "owner": "0x00000000000000000000000000000000000000aa",
            "gasTanks": [{ "chainId": 5, "providerURL": "https://rpc.example" }]
        }"#;
        let record: ProjectRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.api_key, "key-1");
        assert!(record.allowed_origins.is_empty());
        let tank = record.gas_tank(5).unwrap();
        assert_eq!(tank.provider_url, "https://rpc.example");
        assert!(tank.whitelist.is_empty());
        assert!(record.gas_tank(137).is_none());
    }

    #[test]
    fn store_errors_map_to_gateway_errors() {
        assert!(matches!(
            GatewayError::from(StoreError::ProjectNotFound("p1".into())),
            GatewayError::TenantNotFound(id) if id == "p1"
        ));
        assert!(matches!(
            GatewayError::from(StoreError::GasTankNotFound {
                project_id: "p1".into(),
                chain_id: 5
            }),
            GatewayError::GasTankNotFound { chain, .. } if chain == "5"
        ));
        assert!(matches!(
            GatewayError::from(StoreError::AlreadyExists("gas tank 5".into())),
            GatewayError::Validation(_)
        ));
    }
}
