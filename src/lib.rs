// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Zero Wallet Gateway - multi-tenant gasless transaction gateway
//!
//! Wallet holders authenticate by signing a server-issued nonce; the gateway
//! then relays gasless transactions for their smart contract wallets through
//! the gas tank a project has provisioned on each chain.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Nonce sessions, signature recovery and the access control chain
//! - `blockchain` - Supported chains and on-chain owner lookups
//! - `registry` - Lazily loaded projects, gas tanks and whitelists
//! - `relay` - Transaction engine client and relay orchestration
//! - `storage` - Project persistence (in-memory or JSON file)

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod relay;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
