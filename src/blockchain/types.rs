// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain identifiers and the provider endpoint table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Static description of a chain the gateway knows how to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownChain {
    /// Symbolic name used in routes and env var suffixes
    pub name: &'static str,
    /// EIP-155 chain ID
    pub chain_id: u64,
}

pub const GOERLI: KnownChain = KnownChain {
    name: "goerli",
    chain_id: 5,
};

pub const OPTIMISM: KnownChain = KnownChain {
    name: "optimism",
    chain_id: 10,
};

pub const POLYGON: KnownChain = KnownChain {
    name: "polygon",
    chain_id: 137,
};

pub const CELO: KnownChain = KnownChain {
    name: "celo",
    chain_id: 42220,
};

/// Chains supported by this build.
pub const SUPPORTED_CHAINS: [KnownChain; 4] = [GOERLI, OPTIMISM, POLYGON, CELO];

/// A configured chain: identity plus its JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub name: &'static str,
    pub chain_id: u64,
    pub provider_url: url::Url,
}

/// `chain_id -> provider endpoint` table, built and validated at startup.
///
/// Every chain the gateway serves appears here; lookups for anything else
/// fail with a typed error instead of producing an empty endpoint.
#[derive(Debug, Clone, Default)]
pub struct ChainTable {
    chains: BTreeMap<u64, ChainConfig>,
}

impl ChainTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for a supported chain.
    pub fn insert(&mut self, chain: KnownChain, provider_url: url::Url) {
        self.chains.insert(
            chain.chain_id,
            ChainConfig {
                name: chain.name,
                chain_id: chain.chain_id,
                provider_url,
            },
        );
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }
}

/// Reference to a gas tank's chain, either by numeric ID or by name.
///
/// Deserializes from a JSON number or string; numeric strings such as `"5"`
/// become [`ChainRef::Id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged, from = "RawChainRef")]
pub enum ChainRef {
    Id(u64),
    Name(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChainRef {
    Number(u64),
    Text(String),
}

impl From<RawChainRef> for ChainRef {
    fn from(raw: RawChainRef) -> Self {
        match raw {
            RawChainRef::Number(id) => ChainRef::Id(id),
            RawChainRef::Text(text) => ChainRef::parse(&text),
        }
    }
}

impl ChainRef {
    /// Parse a path segment or body field: digits are an ID, anything else a name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(id) => ChainRef::Id(id),
            Err(_) => ChainRef::Name(trimmed.to_ascii_lowercase()),
        }
    }

    /// Resolve to a numeric chain ID if the reference names a supported chain.
    ///
    /// Gas tanks carry their own provider URL, so resolution only checks
    /// support, not whether the startup table has an endpoint.
    pub fn resolve(&self) -> Option<u64> {
        match self {
            ChainRef::Id(id) => SUPPORTED_CHAINS
                .iter()
                .any(|known| known.chain_id == *id)
                .then_some(*id),
            ChainRef::Name(name) => SUPPORTED_CHAINS
                .iter()
                .find(|known| known.name.eq_ignore_ascii_case(name))
                .map(|known| known.chain_id),
        }
    }
}

impl From<u64> for ChainRef {
    fn from(id: u64) -> Self {
        ChainRef::Id(id)
    }
}

impl fmt::Display for ChainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRef::Id(id) => write!(f, "{id}"),
            ChainRef::Name(name) => write!(f, "{name}"),
        }
    }
}
