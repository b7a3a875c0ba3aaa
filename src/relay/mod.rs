// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gasless relay: the transaction engine client and the orchestrator that
//! drives it.

pub mod engine;
pub mod orchestrator;

pub use engine::{HttpTransactionEngine, Relayer, TransactionEngine};
pub use orchestrator::RelayOrchestrator;
