// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AccessControlChain;
use crate::blockchain::{ChainReader, ChainRef};
use crate::config::DashboardSettings;
use crate::error::GatewayError;
use crate::registry::{GasTank, TenantRegistry};
use crate::relay::{RelayOrchestrator, TransactionEngine};
use crate::storage::ProjectStore;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<TenantRegistry>,
    pub access: Arc<AccessControlChain>,
    pub relay: RelayOrchestrator,
    pub dashboard: Arc<DashboardSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        engine: Arc<dyn TransactionEngine>,
        chain_reader: Arc<dyn ChainReader>,
        dashboard: DashboardSettings,
        nonce_ttl: Duration,
    ) -> Self {
        Self {
            tenants: Arc::new(TenantRegistry::new(store, engine, nonce_ttl)),
            access: Arc::new(AccessControlChain::new(chain_reader, dashboard.chain_id)),
            relay: RelayOrchestrator::new(),
            dashboard: Arc::new(dashboard),
        }
    }

    /// Gas tank whose nonce sessions authenticate dashboard operators.
    pub async fn dashboard_tank(&self) -> Result<Arc<GasTank>, GatewayError> {
        let dashboard = self.tenants.get_by_id(&self.dashboard.project_id).await?;
        dashboard
            .gas_tanks()
            .load_and_get(&ChainRef::Id(self.dashboard.chain_id), false)
            .await
    }
}
