// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Multi-tenant resource registry
//!
//! ```text
//! TenantRegistry
//!   └─ Tenant (project)            by id or API key
//!        └─ ResourceRegistry
//!             └─ GasTank           by chain id or name
//!                  ├─ WhitelistManager
//!                  ├─ NonceStore
//!                  └─ Relayer      connected on first relay
//! ```
//!
//! Every lazy level goes through [`single_flight::SingleFlight`].

pub mod gas_tank;
pub mod single_flight;
pub mod sweeper;
pub mod tenant;
pub mod whitelist;

pub use gas_tank::{GasTank, ResourceRegistry};
pub use sweeper::SessionSweeper;
pub use tenant::{NewProject, Tenant, TenantRef, TenantRegistry};
pub use whitelist::WhitelistManager;
