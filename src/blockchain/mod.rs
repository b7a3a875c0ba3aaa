// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides:
//! - The validated `chain_id -> provider endpoint` table
//! - `owner()` reads against smart contract wallets for dashboard auth

pub mod client;
pub mod ownable;
pub mod types;

pub use client::{ChainReadError, ChainReader, EvmChainReader};
pub use types::*;
