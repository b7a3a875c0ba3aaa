// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Expired nonce sessions are already invisible to readers; this background
//! task also reclaims their memory. Every `interval` it walks the loaded
//! projects and gas tanks and purges idle, expired slots.
//!
//! Stops when the shutdown token is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::TenantRegistry;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

pub struct SessionSweeper {
    registry: Arc<TenantRegistry>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(registry: Arc<TenantRegistry>) -> Self {
        Self {
            registry,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }

            self.sweep();
        }
    }

    /// One pass over every loaded gas tank. Returns the number of purged sessions.
    pub fn sweep(&self) -> usize {
        let mut purged = 0;
        for tenant in self.registry.loaded() {
            for tank in tenant.gas_tanks().loaded() {
                purged += tank.nonces().purge_expired();
            }
        }

        if purged > 0 {
            debug!(purged, "Expired sessions purged");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainRef;
    use crate::storage::{GasTankRecord, InMemoryStore, ProjectRecord};
    use crate::testing::MockEngine;
    use alloy::primitives::Address;

    fn registry(ttl: Duration) -> Arc<TenantRegistry> {
        let store = InMemoryStore::with_projects(vec![ProjectRecord {
            id: "p1".into(),
            api_key: "k1".into(),
            name: "Demo".into(),
            owner: Address::ZERO,
            allowed_origins: vec![],
            gas_tanks: vec![GasTankRecord {
                chain_id: 5,
                provider_url: "https://rpc.example".into(),
                whitelist: vec![],
            }],
        }])
        .unwrap();
        Arc::new(TenantRegistry::new(
            Arc::new(store),
            Arc::new(MockEngine::default()),
            ttl,
        ))
    }

    #[tokio::test]
    async fn sweep_purges_expired_sessions_of_loaded_tanks() {
        let registry = registry(Duration::from_millis(10));
        let tenant = registry.get_by_id("p1").await.unwrap();
        let tank = tenant
            .gas_tanks()
            .load_and_get(&ChainRef::Id(5), false)
            .await
            .unwrap();
        tank.nonces().issue(Address::repeat_byte(0xaa)).await;
        tank.nonces().issue(Address::repeat_byte(0xbb)).await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        let sweeper = SessionSweeper::new(Arc::clone(&registry));
        assert_eq!(sweeper.sweep(), 2);
        assert_eq!(tank.nonces().tracked(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let sweeper = SessionSweeper::new(registry(Duration::from_secs(60)))
            .with_interval(Duration::from_millis(5));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
